//! Request context
//!
//! [`RequestContext`] is the JSON view of an in-flight request that schemas
//! are checked against: headers, path parameters, query string and the
//! parsed body. It is built per request from axum's request parts and handed
//! to custom error handlers on rejection.

use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};
use serde_json::{Map, Value};

/// JSON view of a request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    /// Header names are lower-case; repeated headers are joined with `", "`
    pub headers: Value,
    /// Path parameters captured by the matched route
    pub params: Value,
    /// Query string; repeated keys become arrays
    pub query: Value,
    /// Parsed body, `None` when the request has none (or it was not read)
    pub body: Option<Value>,
    pub(crate) body_error: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            body: None,
            body_error: None,
        }
    }
}

impl RequestContext {
    /// An empty GET context, mostly useful in tests
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(mut self, headers: Value) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Build the context from request parts (the body is attached separately)
    pub async fn from_parts(parts: &mut Parts) -> Self {
        let params = match RawPathParams::from_request_parts(parts, &()).await {
            Ok(raw) => Value::Object(
                raw.iter()
                    .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
                    .collect(),
            ),
            Err(_) => Value::Object(Map::new()),
        };

        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: headers_to_json(&parts.headers),
            params,
            query: pairs_to_json(parts.uri.query().unwrap_or_default().as_bytes()),
            body: None,
            body_error: None,
        }
    }

    /// Parse body bytes according to the request's content type
    pub(crate) fn attach_body(&mut self, content_type: Option<&str>, bytes: &[u8]) {
        match parse_body(content_type, bytes) {
            Ok(body) => self.body = body,
            Err(message) => self.body_error = Some(message),
        }
    }

    pub(crate) fn attach_body_error(&mut self, message: String) {
        self.body_error = Some(message);
    }
}

/// Content type of a request, without parameters, lower-cased
pub(crate) fn mime_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
}

pub(crate) fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(map)
}

/// Decode `application/x-www-form-urlencoded` pairs into an object
pub(crate) fn pairs_to_json(input: &[u8]) -> Value {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(map)
}

/// Parse a buffered body
///
/// An empty body, or a JSON `null`, `false`, `0` or `""`, is absent. Returns the message to report
/// when the body cannot be understood.
pub(crate) fn parse_body(content_type: Option<&str>, bytes: &[u8]) -> Result<Option<Value>, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match content_type {
        None | Some("application/json") => parse_json(bytes),
        Some(mime) if mime.ends_with("+json") => parse_json(bytes),
        Some("application/x-www-form-urlencoded") => Ok(Some(pairs_to_json(bytes))),
        Some(mime) if mime.starts_with("text/") => std::str::from_utf8(bytes)
            .map(|s| Some(Value::String(s.to_string())))
            .map_err(|_| "body is not valid UTF-8".to_string()),
        Some(mime) => Err(format!("unsupported content type '{}'", mime)),
    }
}

/// `null`, `false`, `0` and `""` do not count as a body
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn parse_json(bytes: &[u8]) -> Result<Option<Value>, String> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) if is_falsy(&value) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(format!("malformed JSON: {}", e)),
    }
}
