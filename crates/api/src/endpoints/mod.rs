//! API endpoints.

mod questions;
mod search;
mod solution;
mod users;
mod votes;

use axum::{Router, routing::get};

use crate::middleware::AppState;

pub use users::MAX_FORM_BYTES;

async fn health() -> &'static str {
    "OK"
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(questions::router())
        .merge(votes::router())
        .merge(solution::router())
        .merge(search::router())
        .merge(users::router())
}
