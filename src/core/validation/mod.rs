//! Built-in declarative validation
//!
//! [`ObjectSchema`] and [`FieldRule`] give routes a way to describe their
//! headers, path parameters, query string and body without pulling in a
//! separate schema library. Any other [`SchemaValidator`](crate::core::schema::SchemaValidator)
//! implementation works in their place.

pub mod coerce;
pub mod object;
pub mod rules;

pub use object::ObjectSchema;
pub use rules::{FieldRule, FieldType, StringFormat};
