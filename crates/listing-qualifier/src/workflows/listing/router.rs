use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::RawListing;
use super::georisk::GeoRiskResolver;
use super::pipeline::{BatchEntry, CancellationFlag, ListingPipeline, PipelineError};

/// Router builder exposing listing validation over HTTP.
pub fn listing_router<G>(pipeline: Arc<ListingPipeline<G>>) -> Router
where
    G: GeoRiskResolver + 'static,
{
    Router::new()
        .route("/api/v1/listings/validate", post(validate_handler::<G>))
        .route("/api/v1/listings/batch", post(batch_handler::<G>))
        .with_state(pipeline)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub listings: Vec<RawListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
}

pub(crate) async fn validate_handler<G>(
    State(pipeline): State<Arc<ListingPipeline<G>>>,
    body: Bytes,
) -> Response
where
    G: GeoRiskResolver + 'static,
{
    match pipeline.run_json(&body).await {
        Ok(result) if result.is_valid() => (StatusCode::OK, axum::Json(result)).into_response(),
        Ok(result) => (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(result)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn batch_handler<G>(
    State(pipeline): State<Arc<ListingPipeline<G>>>,
    body: Bytes,
) -> Response
where
    G: GeoRiskResolver + 'static,
{
    let request: BatchRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(error) => {
            let payload = json!({
                "error": format!("malformed batch request: {error}"),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let results = pipeline
        .run_batch(&request.listings, &CancellationFlag::new())
        .await;
    (StatusCode::OK, axum::Json(BatchResponse { results })).into_response()
}

fn error_response(error: &PipelineError) -> Response {
    let status = match error {
        PipelineError::MalformedListing(_) => StatusCode::BAD_REQUEST,
        PipelineError::ResolverUnreachable(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
