// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_session, dashboard, export_report, health_check, login_page, logout, report_json,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(login_page))
        .route("/session", post(create_session))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/reports/:key/export", get(export_report))
        .route("/api/reports/:key", get(report_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
