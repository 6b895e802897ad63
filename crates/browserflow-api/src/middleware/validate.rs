//! Request validation middleware.
//!
//! Gathers the body, path parameters and query string of a request into
//! [`RequestSections`], runs the route's [`Validator`] over them, and writes
//! the sanitized sections back: the body is re-serialized, the query string
//! is re-encoded, and the full sanitized set is attached as a
//! [`ValidatedRequest`] extension for handlers. Only sections the route
//! configures are read or rewritten.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{
        HeaderValue, Uri,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        request::Parts,
        uri::PathAndQuery,
    },
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use browserflow_validation::{
    RegistryError, RequestSections, SchemaRegistry, Section, Validator,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;

/// Largest body the middleware buffers.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Sanitized request sections, available to handlers after validation.
#[derive(Debug, Clone, Default)]
pub struct ValidatedRequest(pub RequestSections);

impl ValidatedRequest {
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.section_as(Section::Body)
    }

    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.section_as(Section::Params)
    }

    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.section_as(Section::Query)
    }

    fn section_as<T: DeserializeOwned>(&self, section: Section) -> Result<T, ApiError> {
        serde_json::from_value(self.0.get(section).clone()).map_err(|e| ApiError::from_error(&e))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ValidatedRequest {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ValidatedRequest>()
            .cloned()
            .ok_or_else(|| ApiError::internal("Route is missing request validation"))
    }
}

/// Attach the validator registered for `operation` to `route`.
pub fn validated<S>(
    route: MethodRouter<S>,
    registry: &dyn SchemaRegistry,
    operation: &str,
) -> Result<MethodRouter<S>, RegistryError>
where
    S: Clone + Send + Sync + 'static,
{
    let validator = Arc::new(registry.validator(operation)?);
    Ok(route.route_layer(middleware::from_fn_with_state(validator, validate_request)))
}

/// Validate the configured sections of `request` before it reaches the handler.
pub async fn validate_request(
    State(validator): State<Arc<Validator>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let mut sections = RequestSections::new();

    let body = if validator.covers(Section::Body) {
        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| ApiError::new(413, "Request body is too large or could not be read"))?;
        sections.body = parse_body(&bytes)?;
        None
    } else {
        Some(body)
    };

    if validator.covers(Section::Params) {
        let params = RawPathParams::from_request_parts(&mut parts, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        sections.params = Value::Object(
            params
                .iter()
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect(),
        );
    }

    if validator.covers(Section::Query) {
        sections.query = parse_query(parts.uri.query().unwrap_or_default());
    }

    validator.validate(&mut sections)?;
    debug!(path = %parts.uri.path(), "request validated");

    if validator.covers(Section::Query) {
        parts.uri = with_query(&parts.uri, &sections.query)?;
    }

    let body = match body {
        Some(untouched) => untouched,
        None => {
            let bytes = serde_json::to_vec(&sections.body).map_err(|e| ApiError::from_error(&e))?;
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            Body::from(bytes)
        }
    };

    parts.extensions.insert(ValidatedRequest(sections));
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// An empty body validates as an empty object.
fn parse_body(bytes: &Bytes) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::bad_request(format!("Malformed JSON body: {e}")))
}

/// Decode a query string. Repeated keys collect into an array.
fn parse_query(query: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
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

fn encode_query(query: &Value) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if let Value::Object(map) = query {
        for (key, value) in map {
            match value {
                Value::Array(values) => {
                    for item in values {
                        serializer.append_pair(key, &query_scalar(item));
                    }
                }
                Value::Null => {}
                other => {
                    serializer.append_pair(key, &query_scalar(other));
                }
            }
        }
    }
    serializer.finish()
}

fn query_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn with_query(uri: &Uri, query: &Value) -> Result<Uri, ApiError> {
    let encoded = encode_query(query);
    let path_and_query = if encoded.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{encoded}", uri.path())
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query =
        Some(PathAndQuery::try_from(path_and_query).map_err(|e| ApiError::from_error(&e))?);
    Uri::from_parts(parts).map_err(|e| ApiError::from_error(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query() {
        let query = parse_query("page=2&search=hello%20world&tag=a&tag=b&tag=c");
        assert_eq!(
            query,
            json!({ "page": "2", "search": "hello world", "tag": ["a", "b", "c"] })
        );
    }

    #[test]
    fn test_parse_empty_query() {
        assert_eq!(parse_query(""), json!({}));
    }

    #[test]
    fn test_encode_query() {
        let encoded = encode_query(&json!({ "page": 2, "search": "a b", "full": true, "none": null }));
        assert_eq!(encoded, "full=true&page=2&search=a+b");
    }

    #[test]
    fn test_with_query_replaces_query_string() {
        let uri: Uri = "/api/catalog?page=abc&junk=1".parse().unwrap();
        let rewritten = with_query(&uri, &json!({ "page": 1, "limit": 20 })).unwrap();
        assert_eq!(rewritten.path(), "/api/catalog");
        assert_eq!(rewritten.query(), Some("limit=20&page=1"));

        let cleared = with_query(&uri, &json!({})).unwrap();
        assert_eq!(cleared.to_string(), "/api/catalog");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(&Bytes::new()).unwrap(), json!({}));
        assert_eq!(parse_body(&Bytes::from_static(b"  \n")).unwrap(), json!({}));
        assert_eq!(parse_body(&Bytes::from_static(b"[1]")).unwrap(), json!([1]));

        let err = parse_body(&Bytes::from_static(b"{\"url\":")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.details.is_none());
    }
}
