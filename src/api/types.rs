use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use zeroize::Zeroizing;

use crate::codec;
use crate::domain::{ApiToken, DomainError, Feature, FeatureInput, IssuedToken};

/// Request body for creating or replacing a flag.
///
/// Missing string fields default to empty so they surface as validation errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequest {
    #[serde(default)]
    pub name: String,
    /// `None` when the field is absent, `Some(Value::Null)` for an explicit `null`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub active: bool,
}

impl From<FeatureRequest> for FeatureInput {
    fn from(req: FeatureRequest) -> Self {
        Self {
            name: req.name,
            value: codec::from_json(req.value),
            resource_id: req.resource_id,
            active: req.active,
        }
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureQuery {
    pub resource_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDto {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Box<RawValue>>,
    pub resource_id: String,
    pub active: bool,
    pub created_at: String,
}

impl TryFrom<Feature> for FeatureDto {
    type Error = DomainError;

    fn try_from(feature: Feature) -> Result<Self, Self::Error> {
        Ok(Self {
            value: codec::to_raw_json(&feature.value)?,
            id: feature.id.into(),
            name: feature.name,
            resource_id: feature.resource_id,
            active: feature.active,
            created_at: timestamp(feature.created_at),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<String>,
    pub created_at: String,
    pub created_by_principal: String,
}

impl From<ApiToken> for TokenDto {
    fn from(token: ApiToken) -> Self {
        Self {
            id: token.id.into(),
            name: token.name,
            last_used_at: token.last_used_at.map(timestamp),
            created_at: timestamp(token.created_at),
            created_by_principal: token.created_by_principal,
        }
    }
}

/// The only response that ever carries a raw secret.
#[derive(Debug, Serialize)]
pub struct IssuedTokenDto {
    #[serde(flatten)]
    pub token: TokenDto,
    #[serde(rename = "token")]
    pub secret: SecretField,
}

pub struct SecretField(Zeroizing<String>);

impl Serialize for SecretField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl std::fmt::Debug for SecretField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

impl From<IssuedToken> for IssuedTokenDto {
    fn from(issued: IssuedToken) -> Self {
        Self {
            secret: SecretField(issued.secret),
            token: issued.token.into(),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
