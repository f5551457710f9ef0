use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/user",
            post(handlers::register)
                .get(handlers::get_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/login",
            get(handlers::login_basic).post(handlers::login_json),
        )
        .route("/user/email", put(handlers::update_email))
        .route("/user/password", put(handlers::update_password))
        .route("/users", get(handlers::list_users))
        .route("/email/:email", get(handlers::email_exists))
}
