use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod photos;
pub mod repo;
pub mod service;

// Photos travel base64-encoded inside the JSON body, which inflates the raw
// 1 MiB image cap by roughly 4/3.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            post(handlers::create_profile)
                .get(handlers::get_profile)
                .put(handlers::update_profile),
        )
        .route("/profiles", get(handlers::list_profiles))
        .route("/username/:username", get(handlers::username_exists))
        .route(
            "/phonenumber/:phonenumber",
            get(handlers::phonenumber_exists),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}
