use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tonic::server::NamedService;
use tonic::{Request, Response, Status};
use tracing::Instrument;

use super::pb::{
    self, CreateFeatureRequest, DeleteFeatureRequest, DeleteFeatureResponse, GetFeatureRequest,
    ListFeaturesRequest, ListFeaturesResponse, ToggleFeatureRequest, UpdateFeatureRequest,
    feature_service_server::{FeatureService as FeatureServiceRpc, FeatureServiceServer},
};
use crate::api::AppState;
use crate::auth::{AuthError, Authenticator, Principal};
use crate::codec;
use crate::domain::{DomainError, Feature, FeatureId, FeatureInput, FlagValue};
use crate::outcome::{self, Outcome};
use crate::services::FeatureService;
use crate::telemetry::{self, RequestRecord, Transport};

/// Implements the generated service trait on top of the flag engine.
///
/// Every call authenticates from the `authorization` metadata entry first.
pub struct FeatureRpc {
    features: Arc<dyn FeatureService>,
    authenticator: Arc<Authenticator>,
}

impl FeatureRpc {
    #[must_use]
    pub fn new(features: Arc<dyn FeatureService>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            features,
            authenticator,
        }
    }

    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.feature_service.clone(), state.authenticator.clone())
    }

    async fn authenticate<T>(&self, request: &Request<T>) -> Result<Principal, Status> {
        let header = request
            .metadata()
            .get("authorization")
            .map(|value| {
                value.to_str().map(str::to_owned).map_err(|_| {
                    AuthError::InvalidCredential(
                        "authorization metadata is not valid ASCII".to_string(),
                    )
                })
            })
            .transpose()
            .map_err(|e| auth_status(&e))?;

        let principal = self
            .authenticator
            .authenticate_header(header.as_deref())
            .await
            .map_err(|e| auth_status(&e))?;

        telemetry::record_principal(&principal.subject);
        Ok(principal)
    }
}

#[tonic::async_trait]
impl FeatureServiceRpc for FeatureRpc {
    async fn create_feature(
        &self,
        request: Request<CreateFeatureRequest>,
    ) -> Result<Response<pb::Feature>, Status> {
        observe("CreateFeature", async {
            self.authenticate(&request).await?;
            let req = request.into_inner();
            let input = FeatureInput {
                name: req.name,
                value: decode_value(req.value)?,
                resource_id: req.resource_id,
                active: req.active,
            };
            let feature = self.features.create(input).await.map_err(domain_status)?;
            to_proto(feature).map_err(domain_status)
        })
        .await
    }

    async fn get_feature(
        &self,
        request: Request<GetFeatureRequest>,
    ) -> Result<Response<pb::Feature>, Status> {
        observe("GetFeature", async {
            self.authenticate(&request).await?;
            let id = FeatureId::from(request.into_inner().id);
            let feature = self.features.get_by_id(&id).await.map_err(domain_status)?;
            to_proto(feature).map_err(domain_status)
        })
        .await
    }

    async fn list_features(
        &self,
        request: Request<ListFeaturesRequest>,
    ) -> Result<Response<ListFeaturesResponse>, Status> {
        observe("ListFeatures", async {
            self.authenticate(&request).await?;
            let resource_id = request.into_inner().resource_id;
            let features = self.features.list_all().await.map_err(domain_status)?;

            let features = features
                .into_iter()
                .filter(|f| resource_id.is_empty() || f.resource_id == resource_id)
                .map(to_proto)
                .collect::<Result<Vec<_>, _>>()
                .map_err(domain_status)?;

            Ok::<_, Status>(ListFeaturesResponse { features })
        })
        .await
    }

    async fn update_feature(
        &self,
        request: Request<UpdateFeatureRequest>,
    ) -> Result<Response<pb::Feature>, Status> {
        observe("UpdateFeature", async {
            self.authenticate(&request).await?;
            let req = request.into_inner();
            let id = FeatureId::from(req.id);
            let input = FeatureInput {
                name: req.name,
                value: decode_value(req.value)?,
                resource_id: req.resource_id,
                active: req.active,
            };
            let feature = self
                .features
                .update(&id, input)
                .await
                .map_err(domain_status)?;
            to_proto(feature).map_err(domain_status)
        })
        .await
    }

    async fn delete_feature(
        &self,
        request: Request<DeleteFeatureRequest>,
    ) -> Result<Response<DeleteFeatureResponse>, Status> {
        observe("DeleteFeature", async {
            self.authenticate(&request).await?;
            let id = FeatureId::from(request.into_inner().id);
            self.features.delete(&id).await.map_err(domain_status)?;
            Ok::<_, Status>(DeleteFeatureResponse { success: true })
        })
        .await
    }

    async fn toggle_feature(
        &self,
        request: Request<ToggleFeatureRequest>,
    ) -> Result<Response<pb::Feature>, Status> {
        observe("ToggleFeature", async {
            self.authenticate(&request).await?;
            let req = request.into_inner();
            let feature = self
                .features
                .toggle(&FeatureId::from(req.id), req.active)
                .await
                .map_err(domain_status)?;
            to_proto(feature).map_err(domain_status)
        })
        .await
    }
}

/// Runs one call inside its request span and records how it finished.
async fn observe<T, F>(method: &'static str, call: F) -> Result<Response<T>, Status>
where
    T: Send,
    F: Future<Output = Result<T, Status>> + Send,
{
    let route = format!("/{}/{method}", <FeatureServiceServer<FeatureRpc> as NamedService>::NAME);
    let span = telemetry::request_span(Transport::Grpc, method, &route);
    let start = Instant::now();

    let result = call.instrument(span.clone()).await;

    let code = result.as_ref().map_or_else(Status::code, |_| tonic::Code::Ok);
    span.in_scope(|| {
        telemetry::record_finished(&RequestRecord {
            transport: Transport::Grpc,
            method,
            route: &route,
            status: format!("{code:?}"),
            outcome: Outcome::from_rpc_code(code),
            elapsed: start.elapsed(),
        });
    });

    result.map(Response::new)
}

#[allow(clippy::needless_pass_by_value)]
fn domain_status(err: DomainError) -> Status {
    let (outcome, message) = outcome::classify(&err);
    Status::new(outcome.rpc_code(), message)
}

fn auth_status(err: &AuthError) -> Status {
    let (outcome, message) = outcome::classify(err);
    Status::new(outcome.rpc_code(), message)
}

/// A value the caller sent that cannot be stored is their mistake, not ours.
fn decode_value(value: Option<prost_types::Value>) -> Result<FlagValue, Status> {
    codec::decode(value)
        .map_err(|e| domain_status(DomainError::validation(format!("invalid value: {e}"))))
}

fn to_proto(feature: Feature) -> Result<pb::Feature, DomainError> {
    Ok(pb::Feature {
        value: codec::encode(&feature.value)?,
        id: feature.id.into(),
        name: feature.name,
        resource_id: feature.resource_id,
        active: feature.active,
        created_at: Some(timestamp(feature.created_at)),
    })
}

#[allow(clippy::cast_possible_wrap)]
fn timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}
