//! # request-guard
//!
//! Per-route request validation middleware for axum.
//!
//! Give a route optional schemas for its headers, path parameters, query
//! string and body. Every request is checked in that order; the first failing
//! category stops the request with `400 Invalid <Label> - <message>`, or with
//! whatever a custom error handler returns.
//!
//! ## Features
//!
//! - **Fixed check order**: headers, URL parameters, URL query, request body
//! - **Lenient headers**: undeclared headers never fail validation
//! - **Pluggable schemas**: anything implementing [`SchemaValidator`](core::schema::SchemaValidator)
//! - **Built-in object schemas**: typed fields with coercion, bounds, patterns and formats
//! - **YAML configuration**: declare route schemas in a file
//! - **Tower layer or `from_fn` middleware**: fits either axum style
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use request_guard::prelude::*;
//!
//! let spec = RequestSpec::new()
//!     .query(ObjectSchema::new().field("id", FieldRule::integer().positive().required()));
//!
//! let app = Router::new().route(
//!     "/users",
//!     get(list_users).layer(validate(spec).layer()),
//! );
//! ```

pub mod config;
pub mod core;
pub mod middleware;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        context::RequestContext,
        error::{Category, ConfigError, ErrorFormat, GuardError, ValidationError},
        schema::{SchemaError, SchemaValidator, ValidateOptions, ValidationResult, schema_fn},
        validation::{FieldRule, ObjectSchema, StringFormat},
    };

    // === Middleware ===
    pub use crate::middleware::{
        RequestSpec, RequestValidator, ValidateLayer, ValidatedRequest, validate, validate_request,
    };

    // === Config ===
    pub use crate::config::GuardConfig;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{
        Extension, Router,
        routing::{delete, get, patch, post, put},
    };
}
