#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{Method, header};
use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;

use webhook_gateway::api::admin::{
    clear_logs, get_logs, get_test_mode, list_triggers, require_operator, rotate_auth_key,
    start_test_mode, stop_test_mode, update_trigger,
};
use webhook_gateway::api::webhook::handle_webhook;
use webhook_gateway::api::AppState;
use webhook_gateway::content::MemoryContentStore;
use webhook_gateway::{GatewayCore, paths};

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "webhook gateway is working!".to_string(),
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,webhook_gateway=debug".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting webhook gateway");

    let site_url =
        std::env::var("GATEWAY_SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let db_path = paths::ensure_database_path().expect("Failed to determine database path");
    let content = Arc::new(MemoryContentStore::new(&site_url));

    let core = GatewayCore::new(&db_path, content.clone(), &site_url)
        .expect("Failed to initialize gateway core");

    // Content Store save-pipeline events flow into the trigger dispatcher.
    content.set_events(core.dispatcher.clone());

    tracing::info!(
        "Inbound auth key: {}",
        core.storage
            .config
            .auth_key()
            .expect("Failed to read auth key")
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let state = AppState::new(
        core.storage.clone(),
        core.pipeline.clone(),
        core.test_session.clone(),
    );

    // Administrative surface, behind the operator gate.
    let admin = Router::new()
        .route("/api/logs", get(get_logs).delete(clear_logs))
        .route("/api/auth-key/rotate", post(rotate_auth_key))
        .route("/api/test-mode", get(get_test_mode))
        .route("/api/test-mode/start", post(start_test_mode))
        .route("/api/test-mode/stop", post(stop_test_mode))
        .route("/api/triggers", get(list_triggers))
        .route("/api/triggers/{kind}", put(update_trigger))
        .layer(middleware::from_fn(require_operator));

    let app = Router::new()
        .route("/health", get(health))
        // Inbound webhook endpoint
        .route("/webhook/v1/{action}", post(handle_webhook))
        .merge(admin)
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");

    tracing::info!("Webhook gateway running on http://localhost:3000");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to run axum server");
}
