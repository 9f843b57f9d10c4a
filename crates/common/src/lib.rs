// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between `linkshelf` clients and the server.
//! This module defines the JSON request and response bodies of the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database identifier for users, posts and tags
pub type RecordId = i64;

/// Minimal public view of a user, as carried inside session tokens
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: RecordId,
    pub username: String,
    pub email: String,
}

/// Body of `POST /api/users/register`
///
/// Every field is optional at the wire level so that missing fields can be
/// reported as a validation error instead of a deserialization failure.
#[derive(Deserialize, Debug, Default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Admin registration secret
    pub secret: Option<String>,
}

/// Body of `POST /api/users/login`
#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User as returned right after registration
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Response of `POST /api/users/register`
#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredUser,
}

/// Public profile part of the login response
#[derive(Serialize, Deserialize, Debug)]
pub struct UserData {
    pub username: String,
    pub email: String,
}

/// Response of `POST /api/users/login`
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_data: UserData,
    /// Signed bearer token
    pub access_token: String,
}

/// Response of `GET /api/users/current`
#[derive(Serialize, Deserialize, Debug)]
pub struct CurrentUserResponse {
    pub message: String,
    pub user: UserIdentity,
}

/// A post with its tags decoded into a list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: RecordId,
    pub creator_id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub image: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/posts`
#[derive(Deserialize, Debug, Default, Clone)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Body of `PUT /api/posts/{id}`
///
/// The link of a post is its identity and cannot be changed.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Query string of `GET /api/posts`
#[derive(Deserialize, Debug, Default, Clone)]
pub struct PostListParams {
    /// Free text matched against title and description
    pub query: Option<String>,
    /// Comma separated tag names, all of which must match
    pub tags: Option<String>,
    /// 1-based page number; kept as text so bad values fall back to page 1
    pub page: Option<String>,
}

/// One page of posts
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub current_page: u32,
    pub next_page_exists: bool,
    pub total_pages: u32,
}

/// Response of `GET /api/tags`
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TagList {
    pub all_tags: Vec<String>,
}

/// Error payload returned for every failed request
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Details of an [`ErrorBody`]
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorDetail {
    /// Stable machine-readable code, e.g. `AUTH_001`
    pub code: String,
    /// HTTP reason phrase
    pub title: String,
    pub message: String,
}
