use std::sync::Arc;

use axum::{extract::State, Json};
use linkshelf_common::TagList;

use crate::error::AppError;
use crate::AppState;

/// `GET /api/tags`
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<TagList>, AppError> {
    let all_tags = state.storage.list_tags().await?;
    if all_tags.is_empty() {
        return Err(AppError::NotFound("No tags found".to_string()));
    }
    Ok(Json(TagList { all_tags }))
}
