//! Router-level tests: HTTP statuses and response envelope

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use depository::{Depository, api};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    api::router(Arc::new(Depository::in_memory()))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_provision_then_conflict() {
    let app = app();

    let request = json!({ "tenant_id": "GOVT123", "display_name": "Asha Mehta" });
    let response = app
        .clone()
        .oneshot(post("/api/tenants", request.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["tenant_id"], "GOVT123");

    let response = app.oneshot(post("/api/tenants", request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["error"], "TENANT_CONFLICT");
    assert_eq!(body["error"]["retryable"], false);
}

#[tokio::test]
async fn test_credit_debit_flow() {
    let app = app();
    app.clone()
        .oneshot(post(
            "/api/tenants",
            json!({ "tenant_id": "GOVT123", "display_name": "Asha Mehta" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post(
            "/api/positions/credit",
            json!({ "tenant_id": "GOVT123", "instrument": "ACME", "quantity": 100 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["new_quantity"], 100);

    // Overdraft is a business-rule rejection, not a malformed request.
    let response = app
        .clone()
        .oneshot(post(
            "/api/positions/debit",
            json!({ "tenant_id": "GOVT123", "instrument": "ACME", "quantity": 150 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["error"], "INSUFFICIENT_BALANCE");

    let response = app
        .clone()
        .oneshot(post(
            "/api/positions/debit",
            json!({ "tenant_id": "GOVT123", "instrument": "ACME", "quantity": 100 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["new_quantity"], 0);

    let response = app
        .oneshot(get("/api/portfolio/GOVT123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["holdings"], json!([]));
}

#[tokio::test]
async fn test_company_listing_lifecycle() {
    let app = app();
    let acme = json!({ "ticker": "ACME", "company_name": "Acme Industries", "face_value": 10 });

    let response = app
        .clone()
        .oneshot(post("/api/companies", acme.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["ticker"], "ACME");
    assert_eq!(body["data"]["face_value"], 10);

    // A ticker can only be listed once.
    let response = app.clone().oneshot(post("/api/companies", acme)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["error"], "COMPANY_CONFLICT");

    let response = app.clone().oneshot(get("/api/companies")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["companies"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["companies"][0]["company_name"], "Acme Industries");

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/companies/ACME")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["ticker"], "ACME");

    let response = app.oneshot(get("/api/companies")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["companies"], json!([]));
}

#[tokio::test]
async fn test_delist_unknown_company_is_404() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/companies/GHOST")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["error"], "COMPANY_NOT_FOUND");
}

#[tokio::test]
async fn test_nonpositive_face_value_is_400() {
    let response = app()
        .oneshot(post(
            "/api/companies",
            json!({ "ticker": "ACME", "company_name": "Acme Industries", "face_value": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_unknown_tenant_is_404() {
    let response = app().oneshot(get("/api/portfolio/NOBODY")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["error"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn test_nonpositive_quantity_is_400() {
    let app = app();
    app.clone()
        .oneshot(post(
            "/api/tenants",
            json!({ "tenant_id": "GOVT123", "display_name": "Asha Mehta" }),
        ))
        .await
        .unwrap();

    for quantity in [0, -5] {
        let response = app
            .clone()
            .oneshot(post(
                "/api/positions/credit",
                json!({ "tenant_id": "GOVT123", "instrument": "ACME", "quantity": quantity }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_invalid_tenant_id_charset_is_400() {
    let response = app()
        .oneshot(post(
            "/api/tenants",
            json!({ "tenant_id": "govt;DROP SCHEMA platform", "display_name": "Mallory" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["error"], "INVALID_INPUT");
}
