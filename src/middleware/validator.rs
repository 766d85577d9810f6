//! Validation middleware factory
//!
//! [`validate`] turns a [`RequestSpec`] into a [`RequestValidator`]. Per
//! request the validator checks, in this order and stopping at the first
//! failure:
//!
//! 1. headers (undeclared headers are tolerated)
//! 2. path parameters
//! 3. query string
//! 4. body, only when the request has one
//!
//! A category without a schema is skipped. On success the request proceeds;
//! on failure the custom error handler decides the response, or a 400 is
//! returned with the message `Invalid <Label> - <message>`.

use super::layer::ValidateLayer;
use crate::core::context::{RequestContext, mime_type};
use crate::core::error::{Category, ErrorFormat, ValidationError};
use crate::core::schema::{SchemaValidator, ValidateOptions};
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Default cap on buffered request bodies (1 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Custom rejection callback
///
/// Receives the request context and the error; whatever response it returns
/// is sent as-is.
pub type ErrorHandler = Arc<dyn Fn(&RequestContext, ValidationError) -> Response + Send + Sync>;

/// Schemas for one route, one optional schema per category
#[derive(Clone, Default)]
pub struct RequestSpec {
    pub headers: Option<Arc<dyn SchemaValidator>>,
    pub params: Option<Arc<dyn SchemaValidator>>,
    pub query: Option<Arc<dyn SchemaValidator>>,
    pub body: Option<Arc<dyn SchemaValidator>>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, schema: impl SchemaValidator + 'static) -> Self {
        self.headers = Some(Arc::new(schema));
        self
    }

    pub fn params(mut self, schema: impl SchemaValidator + 'static) -> Self {
        self.params = Some(Arc::new(schema));
        self
    }

    pub fn query(mut self, schema: impl SchemaValidator + 'static) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    pub fn body(mut self, schema: impl SchemaValidator + 'static) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    /// Set the schema for a category
    pub fn with(mut self, category: Category, schema: Arc<dyn SchemaValidator>) -> Self {
        match category {
            Category::Headers => self.headers = Some(schema),
            Category::Params => self.params = Some(schema),
            Category::Query => self.query = Some(schema),
            Category::Body => self.body = Some(schema),
        }
        self
    }

    pub fn schema(&self, category: Category) -> Option<&Arc<dyn SchemaValidator>> {
        match category {
            Category::Headers => self.headers.as_ref(),
            Category::Params => self.params.as_ref(),
            Category::Query => self.query.as_ref(),
            Category::Body => self.body.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ORDER.iter().all(|c| self.schema(*c).is_none())
    }
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("headers", &self.headers.is_some())
            .field("params", &self.params.is_some())
            .field("query", &self.query.is_some())
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// Values that passed validation, after schema coercion
///
/// Inserted into request extensions; take it with
/// `Extension<ValidatedRequest>`. A category without a schema is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedRequest {
    pub headers: Option<Value>,
    pub params: Option<Value>,
    pub query: Option<Value>,
    pub body: Option<Value>,
}

/// Request validation middleware
///
/// Cheap to clone; the spec is shared read-only between requests.
#[derive(Clone)]
pub struct RequestValidator {
    spec: Arc<RequestSpec>,
    on_error: Option<ErrorHandler>,
    error_format: ErrorFormat,
    body_limit: usize,
}

/// Build a validator for `spec`
pub fn validate(spec: RequestSpec) -> RequestValidator {
    RequestValidator::new(spec)
}

impl RequestValidator {
    pub fn new(spec: RequestSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            on_error: None,
            error_format: ErrorFormat::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Take over the response on validation failure
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let validator = validate(spec).on_error(|_ctx, err| {
    ///     (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response()
    /// });
    /// ```
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestContext, ValidationError) -> Response + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Body format of the default 400 rejection
    pub fn error_format(mut self, format: ErrorFormat) -> Self {
        self.error_format = format;
        self
    }

    /// Largest body, in bytes, that will be buffered for validation
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    /// Tower layer running this validator in front of a route
    pub fn layer(&self) -> ValidateLayer {
        ValidateLayer::new(self.clone())
    }

    /// Run the four checks in order, stopping at the first failure
    pub fn check(&self, ctx: &RequestContext) -> Result<ValidatedRequest, ValidationError> {
        let headers = self.check_one(Category::Headers, &ctx.headers, ValidateOptions::allow_unknown())?;
        let params = self.check_one(Category::Params, &ctx.params, ValidateOptions::strict())?;
        let query = self.check_one(Category::Query, &ctx.query, ValidateOptions::strict())?;

        if let (Some(message), Some(_)) = (&ctx.body_error, &self.spec.body) {
            return Err(ValidationError::with_message(Category::Body, message.clone()));
        }
        let body = match &ctx.body {
            Some(body) => self.check_one(Category::Body, body, ValidateOptions::strict())?,
            None => None,
        };

        Ok(ValidatedRequest {
            headers,
            params,
            query,
            body,
        })
    }

    fn check_one(
        &self,
        category: Category,
        candidate: &Value,
        options: ValidateOptions,
    ) -> Result<Option<Value>, ValidationError> {
        let Some(schema) = self.spec.schema(category) else {
            return Ok(None);
        };
        schema
            .validate(candidate, &options)
            .into_result()
            .map(Some)
            .map_err(|detail| ValidationError::new(category, detail))
    }

    /// Produce the response for a failed request
    pub fn reject(&self, ctx: &RequestContext, error: ValidationError) -> Response {
        tracing::debug!(
            method = %ctx.method,
            uri = %ctx.uri,
            category = error.category.key(),
            error = %error,
            "Request rejected by validation"
        );
        match &self.on_error {
            Some(handler) => handler(ctx, error),
            None => self.error_format.render(&error),
        }
    }

    /// Validate `ctx`, then either call `proceed` or reject
    pub async fn handle<F, Fut>(&self, ctx: &RequestContext, proceed: F) -> Response
    where
        F: FnOnce(ValidatedRequest) -> Fut,
        Fut: Future<Output = Response>,
    {
        match self.check(ctx) {
            Ok(validated) => proceed(validated).await,
            Err(error) => self.reject(ctx, error),
        }
    }

    /// Validate an axum request
    ///
    /// Returns the request (body restored, [`ValidatedRequest`] in its
    /// extensions) when it passes, or the rejection response.
    pub async fn inspect(&self, req: Request) -> Result<Request, Response> {
        let (mut parts, body) = req.into_parts();
        let mut ctx = RequestContext::from_parts(&mut parts).await;

        // The body is only buffered when there is a schema to check it against.
        let body = if self.spec.body.is_some() {
            match read_body(body, self.body_limit).await {
                Ok(bytes) => {
                    ctx.attach_body(mime_type(&parts.headers).as_deref(), &bytes);
                    Body::from(bytes)
                }
                Err(message) => {
                    ctx.attach_body_error(message);
                    Body::empty()
                }
            }
        } else {
            body
        };

        match self.check(&ctx) {
            Ok(validated) => {
                tracing::trace!(method = %ctx.method, uri = %ctx.uri, "Request passed validation");
                parts.extensions.insert(validated);
                Ok(Request::from_parts(parts, body))
            }
            Err(error) => Err(self.reject(&ctx, error)),
        }
    }
}

impl fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestValidator")
            .field("spec", &self.spec)
            .field("on_error", &self.on_error.is_some())
            .field("error_format", &self.error_format)
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, String> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            Err(format!("body exceeds the {} byte limit", limit))
        }
        Err(e) => Err(format!("failed to read body: {}", e)),
    }
}

/// Middleware function for `axum::middleware::from_fn_with_state`
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/users/{id}", get(get_user))
///     .route_layer(axum::middleware::from_fn_with_state(validator, validate_request));
/// ```
pub async fn validate_request(
    State(validator): State<RequestValidator>,
    req: Request,
    next: Next,
) -> Response {
    match validator.inspect(req).await {
        Ok(req) => next.run(req).await,
        Err(response) => response,
    }
}
