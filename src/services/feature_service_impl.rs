//! Repository-backed implementation of the `FeatureService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::domain::{DomainError, Feature, FeatureId, FeatureInput, FeatureRepository};
use crate::services::feature_service::FeatureService;

pub struct DefaultFeatureService {
    repo: Arc<dyn FeatureRepository>,
}

impl DefaultFeatureService {
    #[must_use]
    pub fn new(repo: Arc<dyn FeatureRepository>) -> Self {
        Self { repo }
    }
}

fn record(op: &'static str) {
    metrics::counter!("flag_operations_total", "op" => op).increment(1);
}

#[async_trait]
impl FeatureService for DefaultFeatureService {
    async fn create(&self, input: FeatureInput) -> Result<Feature, DomainError> {
        input.validate()?;

        let feature = self.repo.create(input).await?;
        record("create");
        info!(
            feature_id = %feature.id,
            resource_id = %feature.resource_id,
            "Created feature '{}'",
            feature.name
        );

        Ok(feature)
    }

    async fn get_by_id(&self, id: &FeatureId) -> Result<Feature, DomainError> {
        self.repo.get_by_id(id).await
    }

    async fn list_all(&self) -> Result<Vec<Feature>, DomainError> {
        self.repo.get_all().await
    }

    async fn update(&self, id: &FeatureId, input: FeatureInput) -> Result<Feature, DomainError> {
        input.validate()?;

        let feature = self.repo.update(id, input).await?;
        record("update");
        info!(feature_id = %id, "Updated feature '{}'", feature.name);

        Ok(feature)
    }

    async fn delete(&self, id: &FeatureId) -> Result<(), DomainError> {
        self.repo.delete(id).await?;
        record("delete");
        info!(feature_id = %id, "Deleted feature");

        Ok(())
    }

    async fn toggle(&self, id: &FeatureId, active: bool) -> Result<Feature, DomainError> {
        // Single-column write: a concurrent update to other fields is not clobbered.
        let feature = self.repo.set_active(id, active).await?;
        record("toggle");
        info!(feature_id = %id, active, "Toggled feature");

        Ok(feature)
    }
}
