//! Format catalog API handlers.

use axum::{extract::Path, Json};
use serde::Serialize;
use transmute_core::{possible_targets, FormatCatalog, MediaFamily};

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub video: Vec<&'static str>,
    pub audio: Vec<&'static str>,
    pub image: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub source: String,
    /// `None` when the extension is not in the catalog.
    pub family: Option<MediaFamily>,
    pub targets: Vec<String>,
}

/// GET /api/v1/formats
pub async fn list_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        video: FormatCatalog::members(MediaFamily::Video).to_vec(),
        audio: FormatCatalog::members(MediaFamily::Audio).to_vec(),
        image: FormatCatalog::members(MediaFamily::Image).to_vec(),
    })
}

/// GET /api/v1/formats/{ext}/targets
///
/// Unknown extensions get every catalog format.
pub async fn get_targets(Path(ext): Path<String>) -> Json<TargetsResponse> {
    let source = transmute_core::files::normalize_extension(&ext);
    Json(TargetsResponse {
        family: FormatCatalog::family_of(&source),
        targets: possible_targets(&source),
        source,
    })
}
