//! Core module containing the validation capability, request context and errors

pub mod context;
pub mod error;
pub mod schema;
pub mod validation;

pub use context::RequestContext;
pub use error::{Category, ConfigError, ErrorFormat, GuardError, ValidationError};
pub use schema::{SchemaError, SchemaValidator, ValidateOptions, ValidationResult, schema_fn};
pub use validation::{FieldRule, ObjectSchema, StringFormat};
