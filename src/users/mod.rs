use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod avatar;
mod dto;
pub mod handlers;
pub mod repo;
mod validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::register))
        .route("/users/login", post(handlers::login))
        .route("/users/logout", post(handlers::logout))
        .route("/users/logoutAll", post(handlers::logout_all))
        .route(
            "/users/me",
            get(handlers::me)
                .patch(handlers::update_me)
                .delete(handlers::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(handlers::upload_avatar)
                .delete(handlers::delete_avatar)
                // upload ceiling plus multipart framing overhead
                .layer(DefaultBodyLimit::max(2 * 1024 * 1024)),
        )
        .route("/users/:id/avatar", get(handlers::get_avatar))
}
