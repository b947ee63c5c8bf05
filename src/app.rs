use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/activities", post(handlers::create))
        .route(
            "/api/activities/:id",
            put(handlers::edit).delete(handlers::delete),
        )
        .route("/api/toggle", post(handlers::toggle))
        .route("/api/stats", get(handlers::stats))
        .route(
            "/api/profile",
            get(handlers::profile).put(handlers::update_profile),
        )
        .with_state(state)
}
