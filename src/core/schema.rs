//! Schema validation capability
//!
//! The middleware never depends on a concrete validation library. Anything
//! that can check a JSON value and report the first problem implements
//! [`SchemaValidator`]; the built-in [`ObjectSchema`](crate::core::validation::ObjectSchema)
//! is one such implementation, and [`schema_fn`] adapts a closure into another.

use serde_json::Value;
use std::fmt;

/// Options passed to a schema on every validation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Tolerate keys the schema does not declare
    pub allow_unknown: bool,
}

impl ValidateOptions {
    /// Strict options: undeclared keys are rejected
    pub fn strict() -> Self {
        Self::default()
    }

    /// Lenient options: undeclared keys are ignored
    pub fn allow_unknown() -> Self {
        Self {
            allow_unknown: true,
        }
    }
}

/// Failure reported by a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Human-readable message, e.g. `"id" is required`
    pub message: String,
    /// Path of the offending key, outermost first (empty for the root value)
    pub path: Vec<String>,
}

impl SchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    pub fn at(message: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            message: message.into(),
            path,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Outcome of validating one candidate value
///
/// `value` is the candidate after any coercion the schema applies (for
/// example `"5"` becoming `5`). It is populated even when `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub error: Option<SchemaError>,
    pub value: Value,
}

impl ValidationResult {
    /// A passing result carrying the (possibly coerced) value
    pub fn ok(value: Value) -> Self {
        Self { error: None, value }
    }

    /// A failing result
    pub fn fail(error: SchemaError, value: Value) -> Self {
        Self {
            error: Some(error),
            value,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a `Result`, dropping the value on failure
    pub fn into_result(self) -> Result<Value, SchemaError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value),
        }
    }
}

/// Capability to validate a request-data object
///
/// Implementations must be shareable across requests; they are stored behind
/// an `Arc` and called concurrently.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, candidate: &Value, options: &ValidateOptions) -> ValidationResult;
}

impl<T: SchemaValidator + ?Sized> SchemaValidator for std::sync::Arc<T> {
    fn validate(&self, candidate: &Value, options: &ValidateOptions) -> ValidationResult {
        (**self).validate(candidate, options)
    }
}

/// Schema backed by a closure
///
/// Built with [`schema_fn`].
#[derive(Clone)]
pub struct FnSchema<F> {
    f: F,
}

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchema").finish_non_exhaustive()
    }
}

impl<F> SchemaValidator for FnSchema<F>
where
    F: Fn(&Value, &ValidateOptions) -> ValidationResult + Send + Sync,
{
    fn validate(&self, candidate: &Value, options: &ValidateOptions) -> ValidationResult {
        (self.f)(candidate, options)
    }
}

/// Wrap a closure as a [`SchemaValidator`]
///
/// # Example
///
/// ```rust
/// use request_guard::core::schema::{SchemaError, ValidationResult, schema_fn};
///
/// let has_token = schema_fn(|value, _opts| {
///     if value.get("token").is_some() {
///         ValidationResult::ok(value.clone())
///     } else {
///         ValidationResult::fail(SchemaError::new("\"token\" is required"), value.clone())
///     }
/// });
/// # let _ = has_token;
/// ```
pub fn schema_fn<F>(f: F) -> FnSchema<F>
where
    F: Fn(&Value, &ValidateOptions) -> ValidationResult + Send + Sync,
{
    FnSchema { f }
}
