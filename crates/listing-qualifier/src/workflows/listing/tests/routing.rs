use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;

use crate::workflows::listing::router::{self, listing_router};

fn validate_request(body: Vec<u8>) -> Request<Body> {
    Request::post("/api/v1/listings/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request builds")
}

#[tokio::test]
async fn valid_listing_returns_ok() {
    let router = listing_router(Arc::new(pipeline_with(FixedResolver::new(don_mueang_geo()))));
    let body = serde_json::to_vec(&disclosed_listing()).expect("listing serializes");

    let response = router
        .oneshot(validate_request(body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("valid"));
    assert_eq!(payload["record"]["offers"]["price"], json!(2_200_000));
    assert_eq!(
        payload["record"]["environmentalFactors"]["floodRisk"],
        json!("low-seasonal")
    );
    assert!(payload["scores"]["overallScore"].is_u64());
}

#[tokio::test]
async fn undisclosed_risk_returns_unprocessable() {
    let router = listing_router(Arc::new(pipeline_with(FixedResolver::new(don_mueang_geo()))));
    let body = serde_json::to_vec(&scenario_listing()).expect("listing serializes");

    let response = router
        .oneshot(validate_request(body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("invalid"));
    assert_eq!(
        payload["violations"][0]["category"],
        json!({ "kind": "undisclosedRisk", "field": "floodRisk" })
    );
}

#[tokio::test]
async fn malformed_payload_returns_bad_request() {
    let pipeline = Arc::new(pipeline_with(FixedResolver::new(clear_geo())));

    let response = router::validate_handler::<FixedResolver>(
        State(Arc::clone(&pipeline)),
        Bytes::from_static(b"not json"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router::validate_handler::<FixedResolver>(
        State(pipeline),
        Bytes::from_static(b"{\"url\": \"https://example.test/empty\"}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("malformed listing"));
}

#[tokio::test]
async fn unreachable_resolver_returns_bad_gateway() {
    let pipeline = Arc::new(pipeline_with(UnreachableResolver));
    let body = serde_json::to_vec(&scenario_listing()).expect("listing serializes");

    let response =
        router::validate_handler::<UnreachableResolver>(State(pipeline), Bytes::from(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn batch_route_reports_each_listing_in_order() {
    let router = listing_router(Arc::new(pipeline_with(FixedResolver::new(don_mueang_geo()))));
    let body = serde_json::to_vec(&json!({
        "listings": [disclosed_listing(), scenario_listing(), {}],
    }))
    .expect("batch serializes");

    let response = router
        .oneshot(
            Request::post("/api/v1/listings/batch")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["outcome"]["outcome"], json!("completed"));
    assert_eq!(results[0]["outcome"]["detail"]["status"], json!("valid"));
    assert_eq!(results[1]["outcome"]["detail"]["status"], json!("invalid"));
    assert_eq!(results[2]["outcome"]["outcome"], json!("failed"));
}

#[tokio::test]
async fn malformed_batch_returns_bad_request() {
    let pipeline = Arc::new(pipeline_with(FixedResolver::new(clear_geo())));
    let response = router::batch_handler::<FixedResolver>(
        State(pipeline),
        Bytes::from_static(b"{\"listings\": 3}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
