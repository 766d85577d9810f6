//! Field rules
//!
//! A [`FieldRule`] describes one key of an [`ObjectSchema`]: its type and the
//! constraints its value must satisfy. Checks run in a fixed order (type,
//! sign, bounds, allowed values, pattern, format) and stop at the first
//! failure.

use super::coerce;
use super::object::ObjectSchema;
use crate::core::schema::{SchemaError, ValidateOptions};
use regex::Regex;
use serde_json::Value;
use validator::ValidateEmail;

/// Expected type of a field
#[derive(Debug, Clone)]
pub enum FieldType {
    /// Any value, including `null`
    Any,
    String,
    Integer,
    Number,
    Boolean,
    /// Array, optionally with a rule applied to every item
    Array(Option<Box<FieldRule>>),
    /// Nested object
    Object(ObjectSchema),
}

/// Well-known string formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    Uuid,
    /// Calendar date in the given `chrono` format, e.g. `%Y-%m-%d`
    Date(String),
}

/// Validation rule for one field
#[derive(Debug, Clone)]
pub struct FieldRule {
    kind: FieldType,
    required: bool,
    positive: bool,
    min: Option<f64>,
    max: Option<f64>,
    one_of: Option<Vec<Value>>,
    pattern: Option<Regex>,
    format: Option<StringFormat>,
}

impl FieldRule {
    fn of(kind: FieldType) -> Self {
        Self {
            kind,
            required: false,
            positive: false,
            min: None,
            max: None,
            one_of: None,
            pattern: None,
            format: None,
        }
    }

    pub fn any() -> Self {
        Self::of(FieldType::Any)
    }

    pub fn string() -> Self {
        Self::of(FieldType::String)
    }

    pub fn integer() -> Self {
        Self::of(FieldType::Integer)
    }

    pub fn number() -> Self {
        Self::of(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    pub fn array() -> Self {
        Self::of(FieldType::Array(None))
    }

    /// Array whose items must each satisfy `item`
    pub fn array_of(item: FieldRule) -> Self {
        Self::of(FieldType::Array(Some(Box::new(item))))
    }

    pub fn object(schema: ObjectSchema) -> Self {
        Self::of(FieldType::Object(schema))
    }

    /// The field must be present
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Numbers must be strictly greater than zero
    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    /// Lower bound: numeric value, string length, or item count
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Upper bound: numeric value, string length, or item count
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Restrict the value to a fixed set (compared after coercion)
    pub fn one_of<I, V>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Strings must match `pattern`
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn kind(&self) -> &FieldType {
        &self.kind
    }

    /// Check a present value, returning it after coercion
    pub(crate) fn check(
        &self,
        value: &Value,
        path: &[String],
        options: &ValidateOptions,
    ) -> Result<Value, SchemaError> {
        let label = render_path(path);
        let fail = |suffix: String| SchemaError::at(format!("\"{}\" {}", label, suffix), path.to_vec());

        let value = match &self.kind {
            FieldType::Any => value.clone(),
            FieldType::String => coerce::string(value).map_err(|m| fail(m.to_string()))?,
            FieldType::Integer => coerce::integer(value).map_err(|m| fail(m.to_string()))?,
            FieldType::Number => coerce::number(value).map_err(|m| fail(m.to_string()))?,
            FieldType::Boolean => coerce::boolean(value).map_err(|m| fail(m.to_string()))?,
            FieldType::Array(item) => {
                let Value::Array(items) = value else {
                    return Err(fail("must be an array".to_string()));
                };
                match item {
                    Some(rule) => {
                        let mut checked = Vec::with_capacity(items.len());
                        for (index, entry) in items.iter().enumerate() {
                            let mut item_path = path.to_vec();
                            item_path.push(format!("[{}]", index));
                            checked.push(rule.check(entry, &item_path, options)?);
                        }
                        Value::Array(checked)
                    }
                    None => value.clone(),
                }
            }
            FieldType::Object(schema) => {
                if !value.is_object() {
                    return Err(fail("must be of type object".to_string()));
                }
                schema.validate_at(value, path, options)?
            }
        };

        if self.positive {
            if let Some(num) = value.as_f64() {
                if num <= 0.0 {
                    return Err(fail("must be a positive number".to_string()));
                }
            }
        }

        self.check_bounds(&value).map_err(fail)?;

        if let Some(allowed) = &self.one_of {
            if !allowed.contains(&value) {
                let listed: Vec<String> = allowed.iter().map(display_value).collect();
                return Err(fail(format!("must be one of [{}]", listed.join(", "))));
            }
        }

        if self.pattern.is_some() || self.format.is_some() {
            let Some(s) = value.as_str() else {
                return Err(fail("must be a string".to_string()));
            };
            if let Some(pattern) = &self.pattern {
                if !pattern.is_match(s) {
                    return Err(fail(format!(
                        "with value \"{}\" fails to match the required pattern: /{}/",
                        s,
                        pattern.as_str()
                    )));
                }
            }
            if let Some(format) = &self.format {
                check_format(format, s).map_err(fail)?;
            }
        }

        Ok(value)
    }

    fn check_bounds(&self, value: &Value) -> Result<(), String> {
        match value {
            Value::Number(n) => {
                let num = n.as_f64().unwrap_or(0.0);
                if let Some(min) = self.min.filter(|min| num < *min) {
                    return Err(format!("must be greater than or equal to {}", min));
                }
                if let Some(max) = self.max.filter(|max| num > *max) {
                    return Err(format!("must be less than or equal to {}", max));
                }
            }
            Value::String(s) => {
                let len = s.chars().count() as f64;
                if let Some(min) = self.min.filter(|min| len < *min) {
                    return Err(format!("length must be at least {} characters long", min));
                }
                if let Some(max) = self.max.filter(|max| len > *max) {
                    return Err(format!(
                        "length must be less than or equal to {} characters long",
                        max
                    ));
                }
            }
            Value::Array(items) => {
                let len = items.len() as f64;
                if let Some(min) = self.min.filter(|min| len < *min) {
                    return Err(format!("must contain at least {} items", min));
                }
                if let Some(max) = self.max.filter(|max| len > *max) {
                    return Err(format!("must contain less than or equal to {} items", max));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn check_format(format: &StringFormat, s: &str) -> Result<(), String> {
    match format {
        StringFormat::Email if !s.validate_email() => Err("must be a valid email".to_string()),
        StringFormat::Uuid if uuid::Uuid::parse_str(s).is_err() => {
            Err("must be a valid UUID".to_string())
        }
        StringFormat::Date(fmt) if chrono::NaiveDate::parse_from_str(s, fmt).is_err() => {
            Err(format!("must be in {} format", fmt))
        }
        _ => Ok(()),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a key path the way messages quote it: `address.city`, `tags[0]`
pub(crate) fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        return "value".to_string();
    }
    let mut out = String::new();
    for segment in path {
        if !out.is_empty() && !segment.starts_with('[') {
            out.push('.');
        }
        out.push_str(segment);
    }
    out
}
