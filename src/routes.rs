// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::{get, post}, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler, clients::clients_handler, invoices::invoices_handler,
        tasks::{cleaner_tasks_handler, task_webhook, tasks_handler},
        transactions::transactions_handler,
        users::users_handler,
    },
    middleware::auth,
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Signature-checked ingestion endpoint, no session auth.
    let webhook_routes = Router::new().route("/tasks", post(task_webhook));

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/manager/tasks",
            tasks_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/cleaner",
            cleaner_tasks_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/transactions",
            transactions_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/clients", clients_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/invoices",
            invoices_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/webhooks", webhook_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
