//! Domain service for feature flags.
//!
//! Validates caller input and orchestrates the repository. The payload value is
//! carried through untouched.

use crate::domain::{DomainError, Feature, FeatureId, FeatureInput};

/// Domain service trait for feature flags.
#[async_trait::async_trait]
pub trait FeatureService: Send + Sync {
    /// Validates and persists a new flag. The store assigns `id` and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the name or resource id is empty.
    async fn create(&self, input: FeatureInput) -> Result<Feature, DomainError>;

    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if no flag has this id.
    async fn get_by_id(&self, id: &FeatureId) -> Result<Feature, DomainError>;

    /// Returns every flag, unfiltered.
    async fn list_all(&self) -> Result<Vec<Feature>, DomainError>;

    /// Replaces name, value, resource id and active state. `id` and `created_at` are kept.
    async fn update(&self, id: &FeatureId, input: FeatureInput) -> Result<Feature, DomainError>;

    async fn delete(&self, id: &FeatureId) -> Result<(), DomainError>;

    /// Sets the active state and returns the flag as stored afterwards.
    async fn toggle(&self, id: &FeatureId, active: bool) -> Result<Feature, DomainError>;
}
