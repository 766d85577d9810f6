//! Tower integration
//!
//! [`ValidateLayer`] wraps a service (usually an axum route) so every request
//! is validated before it reaches it. Apply it after routing so path
//! parameters are available:
//!
//! ```rust,ignore
//! let app = Router::new().route(
//!     "/users/{id}",
//!     get(get_user).layer(validate(spec).layer()),
//! );
//! ```

use super::validator::RequestValidator;
use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer applying a [`RequestValidator`]
#[derive(Debug, Clone)]
pub struct ValidateLayer {
    validator: RequestValidator,
}

impl ValidateLayer {
    pub fn new(validator: RequestValidator) -> Self {
        Self { validator }
    }
}

impl<S> Layer<S> for ValidateLayer {
    type Service = ValidateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ValidateService {
            inner,
            validator: self.validator.clone(),
        }
    }
}

/// Service produced by [`ValidateLayer`]
#[derive(Debug, Clone)]
pub struct ValidateService<S> {
    inner: S,
    validator: RequestValidator,
}

impl<S> Service<Request> for ValidateService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Keep the instance that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let validator = self.validator.clone();

        Box::pin(async move {
            match validator.inspect(req).await {
                Ok(req) => inner.call(req).await,
                Err(response) => Ok(response),
            }
        })
    }
}
