//! HTTP surface.

pub mod routes;

pub use routes::{ApiError, ApiState, api_routes};
