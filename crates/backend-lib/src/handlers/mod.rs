// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers for the users, posts and tags resources.

pub mod posts;
pub mod tags;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Unwrap a JSON body, turning any extractor rejection into a 400
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(AppError::InvalidInput(rejection.body_text())),
    }
}
