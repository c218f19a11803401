//! API gateway client: credential injection, error normalization and the
//! typed endpoint surface of the TunFin backend.

pub mod api;
pub mod client;
pub mod errors;
pub mod models;
pub mod validate;

pub use api::TunFinApi;
pub use client::{GatewayClient, SUBJECT_HEADER};
pub use errors::{normalize_error, parse_success};
