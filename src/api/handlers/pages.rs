use crate::content::ContentStore;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Public content endpoint backing the site pages.
pub async fn section_data(
    Path(section): Path<String>,
    store: Extension<Arc<ContentStore>>,
) -> impl IntoResponse {
    if !ContentStore::is_valid_section(&section) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid section" })),
        )
            .into_response();
    }

    match store.0.load(&section).await {
        Ok(value) => Json(value).into_response(),
        Err(error) => {
            error!("Failed to load section {section}: {error}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load content" })),
            )
                .into_response()
        }
    }
}
