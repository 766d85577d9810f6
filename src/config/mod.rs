//! Configuration loading and management
//!
//! Route schemas can be declared in YAML instead of code:
//!
//! ```yaml
//! body_limit: 65536
//! error_format: json
//! routes:
//!   create_user:
//!     headers:
//!       fields:
//!         authorization: { type: string, required: true }
//!     body:
//!       fields:
//!         name: { type: string, required: true, min: 1, max: 64 }
//!         email: { type: string, format: email }
//! ```
//!
//! Schemas are compiled when a validator is requested, so a bad pattern or
//! an unknown route fails at startup rather than per request.

use crate::core::error::{Category, ConfigError, ErrorFormat};
use crate::core::validation::{FieldRule, ObjectSchema, StringFormat};
use crate::middleware::{DEFAULT_BODY_LIMIT, RequestSpec, RequestValidator};
use anyhow::Result;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Type names accepted in field declarations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Any,
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// String formats accepted in field declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Email,
    Uuid,
    Date,
}

/// Declaration of one field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type", default)]
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub positive: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Allowed values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,

    /// Regular expression strings must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatKind>,

    /// `chrono` format for `format: date` (defaults to `%Y-%m-%d`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,

    /// Item rule for `type: array`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldConfig>>,

    /// Nested fields for `type: object`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, FieldConfig>,

    /// Tolerate undeclared keys in a nested object
    #[serde(default)]
    pub allow_unknown: bool,
}

impl FieldConfig {
    /// Compile into a [`FieldRule`]; `location` names the field in errors
    pub fn compile(&self, location: &str) -> Result<FieldRule, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidSchema {
            location: location.to_string(),
            message,
        };

        if self.items.is_some() && self.kind != FieldKind::Array {
            return Err(invalid("'items' is only valid for type array".to_string()));
        }
        if !self.fields.is_empty() && self.kind != FieldKind::Object {
            return Err(invalid("'fields' is only valid for type object".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid(format!("min ({}) is greater than max ({})", min, max)));
            }
        }

        let mut rule = match self.kind {
            FieldKind::Any => FieldRule::any(),
            FieldKind::String => FieldRule::string(),
            FieldKind::Integer => FieldRule::integer(),
            FieldKind::Number => FieldRule::number(),
            FieldKind::Boolean => FieldRule::boolean(),
            FieldKind::Array => match &self.items {
                Some(item) => FieldRule::array_of(item.compile(&format!("{}[]", location))?),
                None => FieldRule::array(),
            },
            FieldKind::Object => {
                let mut schema = ObjectSchema::new();
                for (name, field) in &self.fields {
                    schema = schema.field(name, field.compile(&format!("{}.{}", location, name))?);
                }
                if self.allow_unknown {
                    schema = schema.allow_unknown();
                }
                FieldRule::object(schema)
            }
        };

        if self.required {
            rule = rule.required();
        }
        if self.positive {
            rule = rule.positive();
        }
        if let Some(min) = self.min {
            rule = rule.min(min);
        }
        if let Some(max) = self.max {
            rule = rule.max(max);
        }
        if let Some(allowed) = &self.one_of {
            rule = rule.one_of(allowed.iter().cloned());
        }
        if let Some(pattern) = &self.pattern {
            let regex = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
            rule = rule.pattern(regex);
        }
        match (self.format, &self.date_format) {
            (Some(FormatKind::Email), _) => rule = rule.format(StringFormat::Email),
            (Some(FormatKind::Uuid), _) => rule = rule.format(StringFormat::Uuid),
            (Some(FormatKind::Date), fmt) => {
                let fmt = fmt.clone().unwrap_or_else(|| "%Y-%m-%d".to_string());
                rule = rule.format(StringFormat::Date(fmt));
            }
            (None, Some(_)) => {
                return Err(invalid("'date_format' requires format: date".to_string()));
            }
            (None, None) => {}
        }

        Ok(rule)
    }
}

/// Declaration of an object schema for one request category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub allow_unknown: bool,

    #[serde(default)]
    pub fields: IndexMap<String, FieldConfig>,
}

impl SchemaConfig {
    pub fn compile(&self, location: &str) -> Result<ObjectSchema, ConfigError> {
        let mut schema = ObjectSchema::new();
        for (name, field) in &self.fields {
            schema = schema.field(name, field.compile(&format!("{}.{}", location, name))?);
        }
        if self.allow_unknown {
            schema = schema.allow_unknown();
        }
        Ok(schema)
    }
}

/// Schemas for one route
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteSchemas {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<SchemaConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<SchemaConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<SchemaConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<SchemaConfig>,
}

impl RouteSchemas {
    fn get(&self, category: Category) -> Option<&SchemaConfig> {
        match category {
            Category::Headers => self.headers.as_ref(),
            Category::Params => self.params.as_ref(),
            Category::Query => self.query.as_ref(),
            Category::Body => self.body.as_ref(),
        }
    }
}

fn default_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}

/// Complete configuration for request validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Largest body buffered for validation, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,

    /// Body format of the default 400 rejection
    #[serde(default)]
    pub error_format: ErrorFormat,

    /// Route name -> schemas
    #[serde(default)]
    pub routes: IndexMap<String, RouteSchemas>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            error_format: ErrorFormat::default(),
            routes: IndexMap::new(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            })?;
        tracing::debug!(path, routes = config.routes.len(), "Loaded validation config");
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::from)?;
        Ok(config)
    }

    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Compile the schemas of `route`
    pub fn spec(&self, route: &str) -> Result<RequestSpec, ConfigError> {
        let schemas = self.routes.get(route).ok_or_else(|| ConfigError::UnknownRoute {
            route: route.to_string(),
        })?;

        let mut spec = RequestSpec::new();
        for category in Category::ORDER {
            if let Some(schema) = schemas.get(category) {
                let location = format!("routes.{}.{}", route, category.key());
                spec = spec.with(category, Arc::new(schema.compile(&location)?));
            }
        }
        Ok(spec)
    }

    /// Build a ready validator for `route` with this config's limits and format
    pub fn validator(&self, route: &str) -> Result<RequestValidator, ConfigError> {
        Ok(RequestValidator::new(self.spec(route)?)
            .body_limit(self.body_limit)
            .error_format(self.error_format))
    }

    /// Compile every route, failing on the first bad schema
    pub fn validators(&self) -> Result<IndexMap<String, RequestValidator>, ConfigError> {
        self.route_names()
            .map(|name| Ok((name.to_string(), self.validator(name)?)))
            .collect()
    }
}
