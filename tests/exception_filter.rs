use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::Path,
    http::{Request, StatusCode},
    response::Response,
    routing::{get, post},
};
use catchwall::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn find_user(Path(id): Path<u32>) -> Result<Json<Value>, HttpException> {
    match id {
        0 => Err(HttpException::forbidden("Forbidden")),
        1 => Err(HttpException::access_denied()),
        _ => Ok(Json(json!({ "id": id }))),
    }
}

async fn create_order(Json(_order): Json<Value>) -> Result<Json<Value>, Exception> {
    Err(PersistenceError::query_failed("duplicate key").into())
}

async fn upload(body: Bytes) -> String {
    body.len().to_string()
}

async fn broken() -> Result<(), Exception> {
    Err(HttpException::with_response(418, json!(["not", "an", "object"])).into())
}

fn app(options: FilterOptions) -> Router {
    Router::new()
        .route("/users/{id}", get(find_user))
        .route("/orders", post(create_order))
        .route("/broken", get(broken))
        .route("/uploads", post(upload))
        .layer(ExceptionFilterLayer::from_options(options))
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_http_exception_through_router() {
    let response = app(FilterOptions::default())
        .oneshot(
            Request::get("/users/0?verbose=1")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 403);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Forbidden");
    assert_eq!(body["error"], "Forbidden");
    assert_eq!(body["path"], "/users/0?verbose=1");
    assert!(body.get("stack").is_none());
    assert!(!body.to_string().contains("abc-123"));
}

#[tokio::test]
async fn test_access_denied_message_from_catalog() {
    let response = app(FilterOptions::default())
        .oneshot(Request::get("/users/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], ErrorCode::AccessDenied.message());
}

#[tokio::test]
async fn test_successful_route_is_untouched() {
    let response = app(FilterOptions::default())
        .oneshot(Request::get("/users/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "id": 7 }));
}

#[tokio::test]
async fn test_persistence_error_through_router() {
    let response = app(FilterOptions::default().environment("development"))
        .oneshot(
            Request::post("/orders")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"sku":"A-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["error"], "QueryFailedError");
    assert_eq!(body["message"], "duplicate key");
    assert_eq!(body["path"], "/orders");
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn test_malformed_exception_gets_generic_500() {
    let response = app(FilterOptions::default().environment("development"))
        .oneshot(Request::get("/broken").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], ErrorCode::Generic.message());
    assert_eq!(body["error"], "Internal Server Error.");
    assert_eq!(body["path"], "/broken");
    assert!(body.get("stack").is_none());
}

#[tokio::test]
async fn test_body_over_limit_still_reaches_handler() {
    let response = app(FilterOptions::default().body_limit(8))
        .oneshot(
            Request::post("/uploads")
                .body(Body::from("far too long for the limit"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"26");
}

#[tokio::test]
async fn test_large_valid_body_reaches_handler() {
    let payload = vec![b'a'; 1_500_000];
    let response = app(FilterOptions::default())
        .oneshot(Request::post("/uploads").body(Body::from(payload)).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"1500000");
}

#[tokio::test]
async fn test_malformed_json_rejection_gets_envelope() {
    let response = app(FilterOptions::default())
        .oneshot(
            Request::post("/orders")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["path"], "/orders");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to parse the request body as JSON")
    );
}

#[tokio::test]
async fn test_path_rejection_gets_envelope() {
    let response = app(FilterOptions::default())
        .oneshot(Request::get("/users/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["path"], "/users/abc");
}

#[tokio::test]
async fn test_unrouted_path_gets_envelope() {
    let response = app(FilterOptions::default())
        .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/nowhere");
}

#[tokio::test]
async fn test_wrong_method_gets_envelope_and_keeps_allow() {
    let response = app(FilterOptions::default())
        .oneshot(Request::delete("/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().contains_key("allow"));

    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 405);
    assert_eq!(body["error"], "Method Not Allowed");
}
