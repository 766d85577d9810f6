//! End-to-end tests for the validation middleware
//!
//! Each test mounts a real axum router behind `axum_test::TestServer` and
//! checks what a client observes: status codes, bodies, and whether the
//! handler ran.

use axum::Json;
use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum_test::TestServer;
use request_guard::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

async fn echo_validated(Extension(validated): Extension<ValidatedRequest>) -> Json<Value> {
    Json(json!({
        "headers": validated.headers,
        "params": validated.params,
        "query": validated.query,
        "body": validated.body,
    }))
}

async fn ok() -> &'static str {
    "proceeded"
}

fn header(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static(name), HeaderValue::from_static(value))
}

fn id_query() -> RequestSpec {
    RequestSpec::new().query(ObjectSchema::new().field("id", FieldRule::integer().positive().required()))
}

fn server(router: Router) -> TestServer {
    TestServer::try_new(router).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_query_with_positive_integer_string_proceeds() {
        let app = Router::new().route("/users", get(echo_validated).layer(validate(id_query()).layer()));
        let server = server(app);

        let response = server.get("/users").add_query_param("id", "5").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["query"], json!({"id": 5}));
    }

    #[tokio::test]
    async fn test_missing_query_field_rejected_with_label() {
        let app = Router::new().route("/users", get(ok).layer(validate(id_query()).layer()));
        let server = server(app);

        let response = server.get("/users").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid URL Query - \"id\" is required");
    }

    #[tokio::test]
    async fn test_headers_with_extra_fields_pass() {
        let spec = RequestSpec::new()
            .headers(ObjectSchema::new().field("authorization", FieldRule::string().required()));
        let app = Router::new().route("/me", get(ok).layer(validate(spec).layer()));
        let server = server(app);

        let (auth, token) = header("authorization", "token");
        let (extra, one) = header("x-extra", "1");
        let response = server.get("/me").add_header(auth, token).add_header(extra, one).await;

        response.assert_status_ok();
        response.assert_text("proceeded");
    }

    #[tokio::test]
    async fn test_missing_body_skips_body_schema() {
        let spec = RequestSpec::new()
            .body(ObjectSchema::new().field("name", FieldRule::string().required()));
        let app = Router::new().route("/users", post(ok).layer(validate(spec).layer()));
        let server = server(app);

        let response = server.post("/users").await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_custom_error_handler_controls_response() {
        let spec = RequestSpec::new()
            .params(ObjectSchema::new().field("id", FieldRule::string().required()));
        let validator = validate(spec).on_error(|_ctx, err| {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response()
        });
        let app = Router::new().route("/things", get(ok).layer(validator.layer()));
        let server = server(app);

        let response = server.get("/things").await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        response.assert_text("Invalid URL Parameters - \"id\" is required");
    }
}

// =============================================================================
// Properties
// =============================================================================

mod property_tests {
    use super::*;

    #[tokio::test]
    async fn test_route_without_schemas_accepts_anything() {
        let app = Router::new().route(
            "/anything/{id}",
            post(ok).layer(validate(RequestSpec::new()).layer()),
        );
        let server = server(app);

        let response = server
            .post("/anything/xyz")
            .add_query_param("free", "form")
            .json(&json!({"whatever": [1, 2, 3]}))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_path_params_are_validated_and_coerced() {
        let spec = RequestSpec::new()
            .params(ObjectSchema::new().field("id", FieldRule::integer().positive().required()));
        let app = Router::new().route("/users/{id}", get(echo_validated).layer(validate(spec).layer()));
        let server = server(app);

        let response = server.get("/users/42").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["params"], json!({"id": 42}));

        let response = server.get("/users/abc").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid URL Parameters - \"id\" must be a number");
    }

    #[tokio::test]
    async fn test_undeclared_path_param_rejected() {
        let spec = RequestSpec::new()
            .params(ObjectSchema::new().field("org", FieldRule::string().required()));
        let app = Router::new().route(
            "/orgs/{org}/users/{id}",
            get(ok).layer(validate(spec).layer()),
        );
        let server = server(app);

        let response = server.get("/orgs/acme/users/7").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid URL Parameters - \"id\" is not allowed");
    }

    #[tokio::test]
    async fn test_extra_query_field_rejected() {
        let app = Router::new().route("/users", get(ok).layer(validate(id_query()).layer()));
        let server = server(app);

        let response = server
            .get("/users")
            .add_query_param("id", "1")
            .add_query_param("debug", "true")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid URL Query - \"debug\" is not allowed");
    }

    #[tokio::test]
    async fn test_extra_body_field_rejected() {
        let spec = RequestSpec::new()
            .body(ObjectSchema::new().field("name", FieldRule::string().required()));
        let app = Router::new().route("/users", post(ok).layer(validate(spec).layer()));
        let server = server(app);

        let response = server
            .post("/users")
            .json(&json!({"name": "Alice", "admin": true}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid Request Body - \"admin\" is not allowed");
    }

    #[tokio::test]
    async fn test_headers_failure_wins_over_body_failure() {
        let spec = RequestSpec::new()
            .headers(ObjectSchema::new().field("authorization", FieldRule::string().required()))
            .body(ObjectSchema::new().field("name", FieldRule::string().required()));
        let app = Router::new().route("/users", post(ok).layer(validate(spec).layer()));
        let server = server(app);

        let response = server.post("/users").json(&json!({"age": 3})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid Headers - \"authorization\" is required");
    }

    #[tokio::test]
    async fn test_handler_not_called_on_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handler = move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "proceeded"
            }
        };
        let app = Router::new().route("/users", get(handler).layer(validate(id_query()).layer()));
        let server = server(app);

        server.get("/users").await.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        server.get("/users").add_query_param("id", "3").await.assert_status_ok();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_handler_replaces_default_rejection() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let validator = validate(id_query()).on_error(move |ctx, err| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(ctx.query, json!({}));
            assert_eq!(err.category, Category::Query);
            (StatusCode::IM_A_TEAPOT, Json(json!({"reason": err.to_string()}))).into_response()
        });
        let app = Router::new().route("/users", get(ok).layer(validator.layer()));
        let server = server(app);

        let response = server.get("/users").await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
        let body: Value = response.json();
        assert_eq!(body["reason"], "Invalid URL Query - \"id\" is required");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}

// =============================================================================
// Bodies
// =============================================================================

mod body_tests {
    use super::*;

    fn named() -> RequestSpec {
        RequestSpec::new().body(
            ObjectSchema::new()
                .field("name", FieldRule::string().min(1.0).required())
                .field("age", FieldRule::integer()),
        )
    }

    fn app() -> Router {
        Router::new().route("/users", post(echo_validated).layer(validate(named()).layer()))
    }

    #[tokio::test]
    async fn test_valid_json_body_is_coerced() {
        let server = server(app());

        let response = server
            .post("/users")
            .json(&json!({"name": "Alice", "age": "30"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["body"], json!({"name": "Alice", "age": 30}));
    }

    #[tokio::test]
    async fn test_form_body_is_validated() {
        let server = server(app());

        let response = server
            .post("/users")
            .bytes(Bytes::from_static(b"name=Bob&age=41"))
            .content_type("application/x-www-form-urlencoded")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["body"], json!({"name": "Bob", "age": 41}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_body_failure() {
        let server = server(app());

        let response = server
            .post("/users")
            .bytes(Bytes::from_static(b"{\"name\": "))
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(
            response
                .text()
                .starts_with("Invalid Request Body - malformed JSON: ")
        );
    }

    #[tokio::test]
    async fn test_json_null_body_counts_as_absent() {
        let server = server(app());

        let response = server.post("/users").json(&Value::Null).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["body"], Value::Null);
    }

    #[tokio::test]
    async fn test_json_false_body_counts_as_absent() {
        let server = server(app());

        let response = server.post("/users").json(&Value::Bool(false)).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["body"], Value::Null);
    }

    #[tokio::test]
    async fn test_body_still_readable_by_handler() {
        async fn name_of(Json(payload): Json<Value>) -> String {
            payload["name"].as_str().unwrap_or_default().to_string()
        }
        let app = Router::new().route("/users", post(name_of).layer(validate(named()).layer()));
        let server = server(app);

        let response = server.post("/users").json(&json!({"name": "Carol"})).await;

        response.assert_status_ok();
        response.assert_text("Carol");
    }

    #[tokio::test]
    async fn test_json_error_format() {
        let validator = validate(named()).error_format(ErrorFormat::Json);
        let app = Router::new().route("/users", post(ok).layer(validator.layer()));
        let server = server(app);

        let response = server.post("/users").json(&json!({"name": ""})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["message"],
            "Invalid Request Body - \"name\" length must be at least 1 characters long"
        );
        assert_eq!(body["details"]["category"], "body");
        assert_eq!(body["details"]["path"], json!(["name"]));
    }
}

// =============================================================================
// from_fn middleware
// =============================================================================

mod from_fn_tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_request_with_route_layer() {
        let spec = RequestSpec::new()
            .params(ObjectSchema::new().field("id", FieldRule::string().format(StringFormat::Uuid).required()));
        let app = Router::new()
            .route("/orders/{id}", get(echo_validated))
            .route_layer(from_fn_with_state(validate(spec), validate_request));
        let server = server(app);

        let id = uuid::Uuid::new_v4().to_string();
        let response = server.get(&format!("/orders/{}", id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["params"]["id"], id);

        let response = server.get("/orders/42").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid URL Parameters - \"id\" must be a valid UUID");
    }

    #[tokio::test]
    async fn test_repeated_query_keys_validate_as_arrays() {
        let spec = RequestSpec::new().query(
            ObjectSchema::new().field("tag", FieldRule::array_of(FieldRule::string()).max(2.0)),
        );
        let app = Router::new()
            .route("/search", get(echo_validated))
            .route_layer(from_fn_with_state(validate(spec), validate_request));
        let server = server(app);

        let response = server.get("/search?tag=a&tag=b").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["query"], json!({"tag": ["a", "b"]}));

        let response = server.get("/search?tag=a&tag=b&tag=c").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Invalid URL Query - \"tag\" must contain less than or equal to 2 items");
    }
}
