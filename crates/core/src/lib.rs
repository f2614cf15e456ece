//! Core business logic for hasker.
//!
//! Services sit between the HTTP layer and the repositories: they validate
//! input, enforce who may do what, and turn repository results into the
//! shapes the API returns.

pub mod services;

pub use services::*;
