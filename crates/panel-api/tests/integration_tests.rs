//! # Integration Tests for panel-api
//!
//! Drives the assembled router with `oneshot`: health probes, question
//! creation and listing, request normalization failures, constraint
//! violations, pagination, and scope checks against a custom registry.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use panel_api::state::{AppConfig, AppState};
use panel_schema::Registry;

/// Helper: build the test app over the built-in registry.
fn test_app() -> axum::Router {
    panel_api::app(AppState::try_new().unwrap())
}

/// Helper: app whose `POST /game_roles` requires the `write` scope.
fn scoped_app(token: Option<&str>) -> axum::Router {
    let registry = Registry::from_value(&json!({
        "validators": {
            "game_roles": {
                "POST": {
                    "json": {
                        "required": ["content"],
                        "properties": {"content": {"type": "string", "minLength": 2}}
                    }
                }
            }
        },
        "filters": {
            "game_roles": {"POST": {"201": {"schema": {"type": "string"}}}}
        },
        "scopes": {
            "game_roles": {"POST": ["write"]}
        }
    }))
    .unwrap();
    let config = AppConfig {
        port: 8080,
        auth_token: token.map(str::to_string),
    };
    panel_api::app(AppState::try_with_registry(config, registry).unwrap())
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn post_question(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/game_roles")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Question Creation --------------------------------------------------------

#[tokio::test]
async fn test_create_question_returns_content() {
    let response = test_app()
        .oneshot(post_question(json!({"content": "hello", "images": ["a.png"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!("hello"));
}

#[tokio::test]
async fn test_create_question_missing_content_is_property_missing() {
    let response = test_app()
        .oneshot(post_question(json!({"is_public": true})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "PROPERTY_MISSING");
    assert_eq!(
        body["error"]["details"],
        json!([{"name": "property_missing", "message": "`content` is required"}])
    );
}

#[tokio::test]
async fn test_create_question_empty_body_is_property_missing() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/game_roles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "PROPERTY_MISSING");
}

#[tokio::test]
async fn test_create_question_too_short_is_validation_error() {
    let response = test_app()
        .oneshot(post_question(json!({"content": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["instance_path"], "/content");
}

#[tokio::test]
async fn test_create_question_too_many_images_is_validation_error() {
    let response = test_app()
        .oneshot(post_question(
            json!({"content": "hello", "images": ["a", "b", "c", "d"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"][0]["instance_path"], "/images");
}

#[tokio::test]
async fn test_create_question_invalid_json_is_bad_request() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/game_roles")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

// -- Listing ------------------------------------------------------------------

#[tokio::test]
async fn test_list_returns_created_questions_in_order() {
    let app = test_app();
    for content in ["first", "second", "third"] {
        let response = app
            .clone()
            .oneshot(post_question(json!({"content": content})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.clone().oneshot(get("/game_roles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(get("/game_roles?offset=1&limit=1"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([listed[1].clone()]));

    let response = app
        .oneshot(get("/game_roles?page=2&per_page=2"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([listed[2].clone()]));
}

#[tokio::test]
async fn test_list_empty_store() {
    let response = test_app().oneshot(get("/game_roles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_list_per_page_above_maximum_is_rejected() {
    let response = test_app()
        .oneshot(get("/game_roles?per_page=101"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["instance_path"], "/per_page");
}

#[tokio::test]
async fn test_list_non_numeric_page_is_rejected() {
    let response = test_app()
        .oneshot(get("/game_roles?page=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_list_ignores_unknown_query_args() {
    let response = test_app()
        .oneshot(get("/game_roles?sort=desc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Scopes -------------------------------------------------------------------

#[tokio::test]
async fn test_scoped_endpoint_without_configured_token_is_forbidden() {
    let response = scoped_app(None)
        .oneshot(post_question(json!({"content": "hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_scoped_endpoint_requires_bearer_token() {
    let response = scoped_app(Some("secret"))
        .oneshot(post_question(json!({"content": "hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = post_question(json!({"content": "hello"}));
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer wrong".parse().unwrap());
    let response = scoped_app(Some("secret")).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_scoped_endpoint_with_token_succeeds() {
    let mut request = post_question(json!({"content": "hello"}));
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
    let response = scoped_app(Some("secret")).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!("hello"));
}

#[tokio::test]
async fn test_unregistered_method_in_custom_registry_passes_through() {
    // GET has no validator, filter or scopes in the custom registry.
    let response = scoped_app(None).oneshot(get("/game_roles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}
