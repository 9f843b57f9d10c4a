use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use metrics::counter;

use crate::auth::extract_bearer;
use crate::error::AppError;
use crate::metrics::TOKEN_REJECTED;
use crate::AppState;

/// Bearer token gate for protected routes
///
/// On success the caller's [`linkshelf_common::UserIdentity`] is placed in the
/// request extensions for handlers to pick up with `Extension`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let verified = {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        extract_bearer(header).and_then(|token| state.auth.verify_token(token))
    };

    let claims = match verified {
        Ok(claims) => claims,
        Err(rejection) => {
            counter!(TOKEN_REJECTED, "reason" => rejection.to_string()).increment(1);
            return Err(rejection.into());
        },
    };

    tracing::debug!(user_id = claims.user.id, "request authenticated");
    request.extensions_mut().insert(claims.user);

    Ok(next.run(request).await)
}
