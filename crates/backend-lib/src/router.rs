// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router: public and bearer-protected routes under `/api`.
use std::sync::Arc;

use axum::{
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{posts, tags, users};
use crate::middleware::{cors_layer, require_auth};
use crate::AppState;

/// Create the application router
///
/// The bearer check wraps individual handlers; methods a path does not
/// support answer 405 without touching it.
pub fn create_router(state: Arc<AppState>) -> Router {
    let auth = from_fn_with_state(state.clone(), require_auth);
    let cors = cors_layer(&state.settings);

    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route(
            "/api/users/current",
            get(users::current_user.layer(auth.clone())),
        )
        .route(
            "/api/posts",
            get(posts::list_posts).post(posts::create_post.layer(auth.clone())),
        )
        .route(
            "/api/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post.layer(auth.clone()))
                .delete(posts::delete_post.layer(auth)),
        )
        .route("/api/tags", get(tags::list_tags))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
