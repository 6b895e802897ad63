use super::*;
use axum::{
    body::{Body, to_bytes},
    extract::RawQuery,
    http::{Request, StatusCode, header},
};
use browserflow_config::Environment;
use browserflow_validation::VALIDATION_MESSAGE;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::error::{ErrorHandler, ErrorHandlerConfig, INTERNAL_ERROR_MESSAGE};

fn create_test_router(environment: Environment) -> Router {
    let state = Arc::new(AppState::new(environment).unwrap());
    create_router(state).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header(header::CONTENT_TYPE, "application/json");
    }
    let request = request
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(&body.to_string())).await
}

fn detail_fields(envelope: &Value) -> Vec<&str> {
    envelope["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["environment"], "test");
}

#[tokio::test]
async fn test_catalog_query_defaults() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "GET", "/api/catalog", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 20);
    assert_eq!(body["data"]["total"], body["data"]["items"].as_array().unwrap().len());
}

#[tokio::test]
async fn test_catalog_query_coerced() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "GET", "/api/catalog?page=2&limit=5&junk=1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_catalog_filter_by_category() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "GET", "/api/catalog?category=capture", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], "screenshot");
}

#[tokio::test]
async fn test_catalog_query_invalid() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "GET", "/api/catalog?limit=1000&page=zero", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], VALIDATION_MESSAGE);
    assert_eq!(detail_fields(&body), vec!["page", "limit"]);
}

#[tokio::test]
async fn test_catalog_page_out_of_range() {
    let app = create_test_router(Environment::Development);

    for uri in ["/api/catalog?page=99999999999999999999", "/api/catalog?page=1e30"] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail_fields(&body), vec!["page"]);
        assert!(body.get("stack").is_none());
    }

    let (status, body) = send(&app, "GET", "/api/catalog?page=10001", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["message"], "page must be less than or equal to 10000");
}

#[tokio::test]
async fn test_catalog_get_block() {
    let app = create_test_router(Environment::Test);

    let (status, body) = send(&app, "GET", "/api/catalog/navigate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "navigate");

    let (status, body) = send(&app, "GET", "/api/catalog/teleport", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "status": 404, "error": "Block 'teleport' not found" }));
}

#[tokio::test]
async fn test_catalog_get_block_invalid_id() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "GET", "/api/catalog/Not_A_Slug", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["id"]);
}

#[tokio::test]
async fn test_categories() {
    let app = create_test_router(Environment::Test);

    let (status, body) = send(&app, "GET", "/api/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().len() >= 5);

    let (status, body) = send(&app, "GET", "/api/categories/extraction", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "extraction");
    assert_eq!(body["data"]["blocks"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "GET", "/api/categories/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_valid_action_not_implemented() {
    let app = create_test_router(Environment::Test);
    let (status, body) =
        post_json(&app, "/api/actions/navigate", json!({ "url": "https://example.com" })).await;

    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["status"], 501);
    assert_eq!(body["error"], "Action 'navigate' is not implemented yet");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_invalid_action_reports_every_field() {
    let app = create_test_router(Environment::Test);
    let (status, body) = post_json(
        &app,
        "/api/actions/click",
        json!({ "button": "side", "clickCount": "many" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["selector", "button", "clickCount"]);
    assert_eq!(body["details"][0]["message"], "selector is required");
}

#[tokio::test]
async fn test_empty_body_validated() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "POST", "/api/actions/navigate", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["url"]);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "POST", "/api/actions/navigate", Some("{\"url\":")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Malformed JSON body"));
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_wait_conditional_rules() {
    let app = create_test_router(Environment::Test);

    let (status, body) = post_json(&app, "/api/actions/wait", json!({ "type": "selector" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["selector"]);

    let (status, body) = post_json(
        &app,
        "/api/actions/wait",
        json!({ "type": "timeout", "duration": "500", "selector": "#x" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["selector"]);
    assert_eq!(body["details"][0]["message"], "selector is not allowed");

    let (status, _) = post_json(
        &app,
        "/api/actions/wait",
        json!({ "type": "timeout", "duration": "500" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_screenshot_quality_only_for_jpeg() {
    let app = create_test_router(Environment::Test);

    let (status, body) = post_json(&app, "/api/actions/screenshot", json!({ "quality": 80 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["quality"]);

    let (status, _) = post_json(
        &app,
        "/api/actions/screenshot",
        json!({ "format": "jpeg", "quality": 80 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_variables_lifecycle() {
    let app = create_test_router(Environment::Test);

    let (status, body) = send(&app, "PUT", "/api/variables/page_title", Some(r#"{"value":"Example"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "name": "page_title", "value": "Example" }));

    let (status, body) = send(&app, "PUT", "/api/variables/page_title", Some(r#"{"value":42,"x":1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "name": "page_title", "value": 42, "previous": "Example" }));

    let (status, body) = send(&app, "GET", "/api/variables/page_title", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], 42);

    let (_, body) = send(&app, "GET", "/api/variables", None).await;
    assert_eq!(body["data"], json!({ "page_title": 42 }));

    let (status, body) = send(&app, "DELETE", "/api/variables/page_title", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "GET", "/api/variables/page_title", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Variable 'page_title' not found");

    let (status, _) = send(&app, "DELETE", "/api/variables/page_title", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_variable_rejected_when_store_full() {
    let state = Arc::new(AppState::with_variable_limit(Environment::Test, 1).unwrap());
    let app = create_router(state).unwrap();

    let (status, _) = send(&app, "PUT", "/api/variables/first", Some(r#"{"value":1}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "PUT", "/api/variables/second", Some(r#"{"value":2}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Variable limit reached (1 variables)");
    assert!(body.get("details").is_none());

    let (status, body) = send(&app, "PUT", "/api/variables/first", Some(r#"{"value":3}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["previous"], 1);
}

#[tokio::test]
async fn test_set_variable_requires_value() {
    let app = create_test_router(Environment::Test);
    let (status, body) = send(&app, "PUT", "/api/variables/count", Some("{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_fields(&body), vec!["value"]);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = create_test_router(Environment::Production);
    let (status, body) = send(&app, "GET", "/api/unknown", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "success": false, "status": 404, "error": "Route GET /api/unknown not found" })
    );
}

#[tokio::test]
async fn test_method_not_allowed_enveloped() {
    let app = create_test_router(Environment::Test);
    let response = app
        .oneshot(Request::builder().method("POST").uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().contains_key(header::ALLOW));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], 405);
}

async fn leaking_handler() -> &'static str {
    panic!("Memory leak detected.")
}

fn panicking_router(environment: Environment) -> Router {
    let handler = Arc::new(ErrorHandler::new(ErrorHandlerConfig { environment }));
    Router::new()
        .route("/boom", get(leaking_handler))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(handler, handle_errors))
}

#[tokio::test]
async fn test_panic_rendered_as_500_envelope() {
    let app = panicking_router(Environment::Development);
    let (status, body) = send(&app, "GET", "/boom", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Memory leak detected.");
    assert!(body["stack"].is_string());
    assert!(body["stack"].as_str().unwrap().starts_with("Error: Memory leak detected."));
}

#[tokio::test]
async fn test_panic_masked_in_production() {
    let app = panicking_router(Environment::Production);
    let (status, body) = send(&app, "GET", "/boom", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "success": false, "status": 500, "error": INTERNAL_ERROR_MESSAGE }));
}

#[tokio::test]
async fn test_sanitized_query_reaches_handler() {
    let state = Arc::new(AppState::new(Environment::Test).unwrap());
    let route = validated(
        get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
        state.registry.as_ref(),
        schemas::CATALOG_LIST,
    )
    .unwrap();
    let app: Router = Router::new().route("/probe", route);

    let response = app
        .oneshot(Request::builder().uri("/probe?page=3&junk=1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"limit=20&page=3");
}

#[tokio::test]
async fn test_sanitized_body_reaches_handler() {
    let state = Arc::new(AppState::new(Environment::Test).unwrap());
    let route = validated(
        post(|body: String| async move { body }),
        state.registry.as_ref(),
        schemas::ACTIONS_CLICK,
    )
    .unwrap();
    let app: Router = Router::new().route("/probe", route);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/probe")
                .body(Body::from(r##"{"selector":"#go","evil":true}"##))
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "selector": "#go", "button": "left", "clickCount": 1 }));
}
