//! API client module for the Foglio client.
//!
//! Provides the HTTP client with credential header injection, durable
//! credential storage, and request/response types matching the Foglio backend.

pub mod auth;
pub mod client;
pub mod error;
pub mod files;
pub mod types;
pub mod users;

pub use error::ApiError;
