//! Route handlers for the case API.

pub mod cases;
pub mod health;
pub mod token;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
///
/// Case routes are exposed under both `/v1` and `/latest`; the token and
/// health endpoints are unversioned.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/v1", case_routes())
        .nest("/latest", case_routes())
        .route("/token", post(token::login))
        .route("/health", get(health::health))
}

fn case_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cases",
            get(cases::list_cases).post(cases::create_case),
        )
        .route(
            "/cases/",
            get(cases::list_cases).post(cases::create_case),
        )
        .route(
            "/cases/:id",
            get(cases::read_case)
                .put(cases::update_case)
                .delete(cases::delete_case),
        )
}
