use crate::handler::ViolationReportHandler;
use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, StatusCode, Uri};
use axum::routing::get;
use bytes::Bytes;
use tower_http::trace::TraceLayer;

pub async fn health() -> &'static str {
    "ok"
}

async fn receive_report(
    State(handler): State<ViolationReportHandler>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> StatusCode {
    handler.handle(&method, &uri, &body)
}

/// Build the collector router.
///
/// `GET` on `health_check_path` answers the health check; every other request,
/// including other methods on that path, is handed to the report handler.
pub fn build_router(
    handler: ViolationReportHandler,
    health_check_path: &str,
    max_body_bytes: usize,
) -> Router {
    Router::new()
        .route(health_check_path, get(health).fallback(receive_report))
        .fallback(receive_report)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}
