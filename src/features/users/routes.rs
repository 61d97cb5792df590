use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::features::users::handlers;
use crate::features::users::repositories::UserRepository;

/// Create routes for the users feature
pub fn routes(repository: Arc<dyn UserRepository>, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(handlers::list_users))
        .route("/user/{id}", get(handlers::get_user))
        .route(
            "/create",
            post(handlers::create_user).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/delete", delete(handlers::delete_user_missing_id))
        .route("/delete/", delete(handlers::delete_user_missing_id))
        .route("/delete/{id}", delete(handlers::delete_user))
        .with_state(repository)
}
