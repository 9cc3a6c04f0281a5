use axum::{
    extract::{DefaultBodyLimit, State},
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{files, formats, handlers, middleware::metrics_middleware};
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.config().files.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Engine session
        .route("/engine", get(handlers::get_engine))
        .route("/engine/init", post(handlers::init_engine))
        // Format catalog
        .route("/formats", get(formats::list_formats))
        .route("/formats/{ext}/targets", get(formats::get_targets))
        // Files
        .route("/files", post(files::upload_file).get(files::list_files))
        .route(
            "/files/{name}",
            get(files::get_file).delete(files::remove_file),
        )
        .route("/files/{name}/detect", post(files::detect_file))
        .route("/files/{name}/target", put(files::set_target))
        .route("/files/{name}/convert", post(files::convert_file))
        .route("/files/{name}/download", get(files::download_file))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
