//! Core domain types for the portico portfolio service.
//!
//! This crate holds the error taxonomy, configuration, domain models, and
//! upload validation rules shared by the repository, service, and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
