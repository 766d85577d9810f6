//! Simple example: a small user API guarded by request validation
//!
//! Run with `RUST_LOG=request_guard=debug,tower_http=debug` to watch
//! rejections in the log, then try:
//!
//! ```text
//! curl -i 'localhost:3000/users/7?expand=teams'
//! curl -i 'localhost:3000/users/0'
//! curl -i -X POST localhost:3000/users -H 'authorization: Bearer t' \
//!      -H 'content-type: application/json' -d '{"name":"Ada","email":"ada@example.com"}'
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use request_guard::prelude::*;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const ROUTES: &str = r#"
error_format: json
routes:
  create_user:
    headers:
      fields:
        authorization: { type: string, required: true, pattern: "^Bearer .+" }
    body:
      fields:
        name: { type: string, required: true, min: 1, max: 64 }
        email: { type: string, format: email, required: true }
"#;

async fn get_user(Extension(validated): Extension<ValidatedRequest>) -> impl IntoResponse {
    Json(json!({
        "id": validated.params.as_ref().map(|p| p["id"].clone()),
        "expand": validated.query.as_ref().and_then(|q| q.get("expand").cloned()),
    }))
}

async fn create_user(Extension(validated): Extension<ValidatedRequest>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(validated.body.unwrap_or(Value::Null)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Routes can be guarded with schemas built in code...
    let get_user_guard = validate(
        RequestSpec::new()
            .params(ObjectSchema::new().field("id", FieldRule::integer().positive().required()))
            .query(ObjectSchema::new().field("expand", FieldRule::string().one_of(["profile", "teams"]))),
    )
    .on_error(|_ctx, err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response());

    // ...or loaded from configuration.
    let config = GuardConfig::from_yaml_str(ROUTES)?;
    let create_user_guard = config.validator("create_user")?;

    let app = Router::new()
        .route("/users/{id}", get(get_user).layer(get_user_guard.layer()))
        .route("/users", post(create_user).layer(create_user_guard.layer()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
