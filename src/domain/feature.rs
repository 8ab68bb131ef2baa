use chrono::{DateTime, Utc};

use super::{DomainError, FeatureId};

/// Opaque payload attached to a flag.
///
/// Holds the canonical (compact) JSON text exactly as it is persisted. `None`
/// means the flag carries no value at all, which is distinct from a JSON `null`.
/// Nothing outside [`crate::codec`] looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagValue(Option<String>);

impl FlagValue {
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self(Some(value.to_string()))
    }

    /// Wraps text read back from storage. The text is trusted to be canonical JSON.
    #[must_use]
    pub const fn from_stored(text: Option<String>) -> Self {
        Self(text)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    #[must_use]
    pub fn into_stored(self) -> Option<String> {
        self.0
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

/// A persisted feature flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    pub value: FlagValue,
    pub resource_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// The replaceable part of a flag, as supplied by a caller on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInput {
    pub name: String,
    pub value: FlagValue,
    pub resource_id: String,
    pub active: bool,
}

impl FeatureInput {
    /// Checks the invariants every persisted flag must satisfy.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::validation("feature name cannot be empty"));
        }
        if self.resource_id.is_empty() {
            return Err(DomainError::validation("resource ID cannot be empty"));
        }
        Ok(())
    }
}
