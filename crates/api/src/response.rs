//! API response types.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Body of a successful vote.
#[derive(Debug, Serialize)]
pub struct VotesResponse {
    pub votes: i64,
}

/// `302 Found` to `location`.
#[must_use]
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// 200 with an empty body.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::OK
}

/// 204 with an empty body.
#[must_use]
pub fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
