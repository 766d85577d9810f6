//! Object schemas
//!
//! An [`ObjectSchema`] is an ordered set of named [`FieldRule`]s. Declared
//! fields are checked in declaration order, then any undeclared keys, and
//! validation stops at the first problem.

use super::rules::{FieldRule, render_path};
use crate::core::schema::{SchemaError, SchemaValidator, ValidateOptions, ValidationResult};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Declarative schema for a JSON object
///
/// # Example
///
/// ```rust
/// use request_guard::core::validation::{FieldRule, ObjectSchema};
///
/// let query = ObjectSchema::new()
///     .field("id", FieldRule::integer().positive().required())
///     .field("verbose", FieldRule::boolean());
/// # let _ = query;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, FieldRule>,
    allow_unknown: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field (redeclaring a name replaces the rule in place)
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.insert(name.into(), rule);
        self
    }

    /// Tolerate undeclared keys regardless of the options passed at validation time
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    pub fn allows_unknown(&self) -> bool {
        self.allow_unknown
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn validate_at(
        &self,
        candidate: &Value,
        path: &[String],
        options: &ValidateOptions,
    ) -> Result<Value, SchemaError> {
        let Some(object) = candidate.as_object() else {
            return Err(SchemaError::at(
                format!("\"{}\" must be of type object", render_path(path)),
                path.to_vec(),
            ));
        };

        let mut output = Map::with_capacity(object.len());

        for (name, rule) in &self.fields {
            let mut field_path = path.to_vec();
            field_path.push(name.clone());

            match object.get(name) {
                Some(value) => {
                    let checked = rule.check(value, &field_path, options)?;
                    output.insert(name.clone(), checked);
                }
                None if rule.is_required() => {
                    return Err(SchemaError::at(
                        format!("\"{}\" is required", render_path(&field_path)),
                        field_path,
                    ));
                }
                None => {}
            }
        }

        let tolerate_unknown = self.allow_unknown || options.allow_unknown;
        for (key, value) in object {
            if self.fields.contains_key(key) {
                continue;
            }
            if !tolerate_unknown {
                let mut field_path = path.to_vec();
                field_path.push(key.clone());
                return Err(SchemaError::at(
                    format!("\"{}\" is not allowed", render_path(&field_path)),
                    field_path,
                ));
            }
            output.insert(key.clone(), value.clone());
        }

        Ok(Value::Object(output))
    }
}

impl SchemaValidator for ObjectSchema {
    fn validate(&self, candidate: &Value, options: &ValidateOptions) -> ValidationResult {
        match self.validate_at(candidate, &[], options) {
            Ok(value) => ValidationResult::ok(value),
            Err(error) => ValidationResult::fail(error, candidate.clone()),
        }
    }
}
