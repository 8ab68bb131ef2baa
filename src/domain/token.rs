use chrono::{DateTime, Utc};
use std::fmt;
use zeroize::Zeroizing;

use super::TokenId;

/// Public view of an API token. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiToken {
    pub id: TokenId,
    pub name: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by_principal: String,
}

/// What the issuer hands to the repository. Only the digest ever crosses this boundary.
#[derive(Clone, PartialEq, Eq)]
pub struct NewApiToken {
    pub name: String,
    pub secret_hash: String,
    pub created_by_principal: String,
}

impl fmt::Debug for NewApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewApiToken")
            .field("name", &self.name)
            .field("secret_hash", &"<redacted>")
            .field("created_by_principal", &self.created_by_principal)
            .finish()
    }
}

/// Result of issuing a token: the raw secret, shown exactly once, and the stored record.
pub struct IssuedToken {
    pub secret: Zeroizing<String>,
    pub token: ApiToken,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("secret", &"<redacted>")
            .field("token", &self.token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_secret_material() {
        let issued = IssuedToken {
            secret: Zeroizing::new("super-secret-value".to_string()),
            token: ApiToken {
                id: TokenId::from("t-1".to_string()),
                name: "ci".to_string(),
                last_used_at: None,
                created_at: Utc::now(),
                created_by_principal: "user-1".to_string(),
            },
        };
        let rendered = format!("{issued:?}");
        assert!(!rendered.contains("super-secret-value"));

        let new = NewApiToken {
            name: "ci".to_string(),
            secret_hash: "abcdef0123".to_string(),
            created_by_principal: "user-1".to_string(),
        };
        assert!(!format!("{new:?}").contains("abcdef0123"));
    }
}
