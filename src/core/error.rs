//! Typed error handling for request-guard
//!
//! # Error Categories
//!
//! - [`ValidationError`]: a request failed one of the four checks
//! - [`ConfigError`]: schemas or configuration could not be loaded or compiled
//!
//! [`GuardError`] wraps both for callers that want a single type.
//!
//! A request-time failure always surfaces as a [`ValidationError`]: a custom
//! schema that fails for reasons of its own is reported exactly like a data
//! mismatch.

use crate::core::schema::SchemaError;
use axum::Json;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The part of the request a check looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Headers,
    Params,
    Query,
    Body,
}

impl Category {
    /// All categories, in the order they are checked
    pub const ORDER: [Category; 4] = [
        Category::Headers,
        Category::Params,
        Category::Query,
        Category::Body,
    ];

    /// Human-readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Category::Headers => "Headers",
            Category::Params => "URL Parameters",
            Category::Query => "URL Query",
            Category::Body => "Request Body",
        }
    }

    /// Key used in configuration files and JSON error details
    pub fn key(&self) -> &'static str {
        match self {
            Category::Headers => "headers",
            Category::Params => "params",
            Category::Query => "query",
            Category::Body => "body",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A request failed validation
///
/// Displays as `Invalid <Label> - <message>`, e.g.
/// `Invalid URL Query - "id" is required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Which check failed
    pub category: Category,
    /// What the schema reported
    pub detail: SchemaError,
}

impl ValidationError {
    pub fn new(category: Category, detail: SchemaError) -> Self {
        Self { category, detail }
    }

    /// Shorthand for a failure with no key path
    pub fn with_message(category: Category, message: impl Into<String>) -> Self {
        Self::new(category, SchemaError::new(message))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn error_code(&self) -> &'static str {
        "VALIDATION_ERROR"
    }

    /// Convert to a JSON error response body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: Some(serde_json::json!({
                "category": self.category.key(),
                "path": self.detail.path,
            })),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} - {}", self.category.label(), self.detail.message)
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.detail)
    }
}

/// Default rejection: 400 with the message as a plain-text body
impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        ErrorFormat::Text.render(&self)
    }
}

/// Error response structure for JSON rejections
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// How the default rejection renders its body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    /// `text/plain` body equal to the error message
    #[default]
    Text,
    /// JSON [`ErrorResponse`]
    Json,
}

impl ErrorFormat {
    pub fn render(&self, error: &ValidationError) -> Response {
        match self {
            ErrorFormat::Text => (
                error.status_code(),
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                error.to_string(),
            )
                .into_response(),
            ErrorFormat::Json => (error.status_code(), Json(error.to_response())).into_response(),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while loading configuration or compiling schemas
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse a configuration document
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// I/O error reading a configuration file
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// No schemas are configured under this route name
    #[error("Unknown route '{route}'")]
    UnknownRoute { route: String },

    /// A schema definition is malformed
    #[error("Invalid schema for {location}: {message}")]
    InvalidSchema { location: String, message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref().map(|f| format!(" '{}'", f)).unwrap_or_default()
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
            ConfigError::UnknownRoute { .. } => "CONFIG_UNKNOWN_ROUTE",
            ConfigError::InvalidSchema { .. } => "CONFIG_INVALID_SCHEMA",
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Top-level error
// =============================================================================

/// The main error type for request-guard
#[derive(Debug)]
pub enum GuardError {
    /// A request failed validation
    Validation(ValidationError),

    /// Configuration errors
    Config(ConfigError),
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::Validation(e) => write!(f, "{}", e),
            GuardError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardError::Validation(e) => Some(e),
            GuardError::Config(e) => Some(e),
        }
    }
}

impl GuardError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GuardError::Validation(e) => e.status_code(),
            GuardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GuardError::Validation(e) => e.error_code(),
            GuardError::Config(e) => e.error_code(),
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            GuardError::Validation(e) => e.to_response(),
            GuardError::Config(e) => ErrorResponse {
                code: e.error_code().to_string(),
                message: e.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<ValidationError> for GuardError {
    fn from(err: ValidationError) -> Self {
        GuardError::Validation(err)
    }
}

impl From<ConfigError> for GuardError {
    fn from(err: ConfigError) -> Self {
        GuardError::Config(err)
    }
}

/// A specialized Result type for request-guard operations
pub type GuardResult<T> = Result<T, GuardError>;
