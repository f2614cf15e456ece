//! HTTP API layer for hasker.
//!
//! JSON endpoints for questions, answers, votes, search and accounts, plus
//! the bearer-token middleware that resolves the caller.
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::{MAX_FORM_BYTES, router};
