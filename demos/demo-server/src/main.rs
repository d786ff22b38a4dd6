use axum::{
    Json, Router,
    extract::Path,
    routing::{get, post},
};
use catchwall::prelude::*;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
struct User {
    id: u32,
    name: String,
}

#[derive(Deserialize)]
struct CreateOrder {
    sku: String,
}

async fn health() -> &'static str {
    "ok"
}

async fn get_user(Path(id): Path<u32>) -> Result<Json<User>, HttpException> {
    match id {
        0 => Err(HttpException::access_denied()),
        1..=100 => Ok(Json(User {
            id,
            name: format!("user-{id}"),
        })),
        _ => Err(HttpException::not_found(format!("User {id} not found"))),
    }
}

async fn create_order(Json(order): Json<CreateOrder>) -> Result<Json<serde_json::Value>, Exception> {
    if order.sku.is_empty() {
        return Err(HttpException::with_response(
            400,
            serde_json::json!({
                "statusCode": 400,
                "message": ["sku must not be empty"],
                "error": "Bad Request",
            }),
        )
        .into());
    }
    // Every order collides with an existing row to show the persistence path
    Err(PersistenceError::query_failed(format!(
        "duplicate key value violates unique constraint \"orders_sku_key\" ({})",
        order.sku
    ))
    .into())
}

async fn not_found(uri: axum::http::Uri) -> HttpException {
    HttpException::not_found(format!("Cannot find {}", uri.path()))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Starting demo server...");

    let filter = AllExceptionFilter::from_env().expect("Invalid exception filter configuration");
    tracing::info!(
        environment = %filter.options().environment,
        expose_stack = filter.options().expose_stack(),
        "Exception filter configured"
    );

    let router = Router::new()
        .route("/health", get(health))
        .route("/users/{id}", get(get_user))
        .route("/orders", post(create_order))
        .fallback(not_found)
        .layer(ExceptionFilterLayer::from(filter))
        .layer(TraceLayer::new_for_http());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("✅ Server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("🛑 Initiating graceful shutdown...");
        })
        .await
        .expect("Server error");

    tracing::info!("👋 Server stopped");
}
