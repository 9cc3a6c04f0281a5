use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use transmute_core::{Config, SessionState};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

#[derive(Debug, Serialize)]
pub struct EngineStatusResponse {
    pub engine: String,
    pub state: SessionState,
}

async fn engine_status(state: &AppState) -> EngineStatusResponse {
    EngineStatusResponse {
        engine: state.session().engine_name().to_string(),
        state: state.session().state().await,
    }
}

/// GET /api/v1/engine
pub async fn get_engine(State(state): State<Arc<AppState>>) -> Json<EngineStatusResponse> {
    Json(engine_status(&state).await)
}

/// POST /api/v1/engine/init
///
/// Loads the engine if it is not loaded yet.
pub async fn init_engine(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EngineStatusResponse>, ApiError> {
    state.session().initialize().await?;
    Ok(Json(engine_status(&state).await))
}
