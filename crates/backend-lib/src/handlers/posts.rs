// ============================
// crates/backend-lib/src/handlers/posts.rs
// ============================
//! Post listing and CRUD endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use linkshelf_common::{
    CreatePostRequest, Post, PostListParams, PostPage, RecordId, UpdatePostRequest, UserIdentity,
};
use metrics::counter;

use super::json_body;
use crate::error::AppError;
use crate::metrics::{POST_CREATED, POST_DELETED, POST_UPDATED};
use crate::storage::PostQuery;
use crate::validation::{
    parse_page, parse_post_id, parse_tag_filter, present, validate_new_post,
    validate_post_changes,
};
use crate::AppState;

const POST_NOT_FOUND: &str = "Post does not exists!";

/// Load a post the caller is allowed to modify
async fn owned_post(
    state: &AppState,
    id: RecordId,
    user: &UserIdentity,
) -> Result<Post, AppError> {
    let post = state
        .storage
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))?;

    if post.creator_id != user.id {
        tracing::warn!(post_id = id, user_id = user.id, "post modification denied");
        return Err(AppError::Forbidden(
            "Only the creator can modify this post!".to_string(),
        ));
    }
    Ok(post)
}

/// `GET /api/posts?query=&tags=&page=`
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostListParams>,
) -> Result<Json<PostPage>, AppError> {
    let query = PostQuery {
        search: present(params.query.as_deref()).map(str::to_string),
        tags: parse_tag_filter(params.tags.as_deref()),
        page: parse_page(params.page.as_deref()),
        per_page: state.settings.posts_per_page,
    };

    let page = state.storage.list_posts(&query).await?;
    Ok(Json(page))
}

/// `GET /api/posts/{id}`
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Post>, AppError> {
    let id = parse_post_id(&raw_id)?;

    state
        .storage
        .get_post(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))
}

/// `POST /api/posts`
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserIdentity>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let req = json_body(payload)?;
    let new_post = validate_new_post(&req)?;

    let post = state.storage.create_post(user.id, new_post).await?;

    counter!(POST_CREATED).increment(1);
    tracing::info!(post_id = post.id, user_id = user.id, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// `PUT /api/posts/{id}`
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserIdentity>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<Post>, AppError> {
    let id = parse_post_id(&raw_id)?;
    owned_post(&state, id, &user).await?;

    let req = json_body(payload)?;
    let changes = validate_post_changes(&req)?;

    // The row can vanish between the ownership check and the write
    let post = state
        .storage
        .update_post(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))?;

    counter!(POST_UPDATED).increment(1);
    tracing::info!(post_id = id, user_id = user.id, "post updated");

    Ok(Json(post))
}

/// `DELETE /api/posts/{id}`
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserIdentity>,
    Path(raw_id): Path<String>,
) -> Result<Json<Post>, AppError> {
    let id = parse_post_id(&raw_id)?;
    owned_post(&state, id, &user).await?;

    let post = state
        .storage
        .delete_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))?;

    counter!(POST_DELETED).increment(1);
    tracing::info!(post_id = id, user_id = user.id, "post deleted");

    Ok(Json(post))
}
