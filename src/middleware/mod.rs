//! Request validation middleware
//!
//! - [`validator`]: the factory, the ordered checks and the axum middleware function
//! - [`layer`]: tower `Layer`/`Service` wrapper

pub mod layer;
pub mod validator;

pub use layer::{ValidateLayer, ValidateService};
pub use validator::{
    DEFAULT_BODY_LIMIT, ErrorHandler, RequestSpec, RequestValidator, ValidatedRequest, validate,
    validate_request,
};
