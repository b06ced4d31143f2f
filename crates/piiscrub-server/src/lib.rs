//! piiscrub server
//!
//! Configuration loading and the axum application that exposes the
//! sanitizer over HTTP.

pub mod app;
pub mod config;

pub use app::{ApiError, AppState, QueryParams, SanitizeRequest, router};
pub use config::{LoggingConfig, ServerConfig, TokenizationConfig};
