//! Request correlation ids.
//!
//! Every request gets an id, taken from an incoming `X-Request-Id` header when
//! it looks sane and generated otherwise. The id is recorded on the request's
//! tracing span, echoed in the response header and written into the
//! `error.request_id` field of JSON error bodies.

use axum::{
    body::Body,
    extract::Request,
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Longest client-supplied id that is propagated as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-supplied id if it is short and made of URL-safe
    /// characters; anything else is replaced rather than logged verbatim.
    pub fn from_header(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_REQUEST_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::from_header)
        .unwrap_or_else(RequestId::generate);

    req.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let response = next.run(req).instrument(span).await;
    let mut response = tag_error_body(response, &request_id).await;

    if let Ok(value) = request_id.as_str().parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Add `request_id` to the `error` object of a JSON 4xx/5xx body. Other
/// responses pass through untouched.
async fn tag_error_body(response: Response, request_id: &RequestId) -> Response {
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer error response body");
            parts.headers.remove(CONTENT_LENGTH);
            return (parts, Body::empty()).into_response();
        }
    };

    let Ok(mut json) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    let Some(error) = json.get_mut("error").and_then(|e| e.as_object_mut()) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    error.insert(
        "request_id".to_string(),
        serde_json::Value::String(request_id.to_string()),
    );

    match serde_json::to_vec(&json) {
        Ok(tagged) => {
            // The body grew; let hyper recompute the length.
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(tagged))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }

    #[test]
    fn test_header_values_are_screened() {
        assert_eq!(
            RequestId::from_header("abc-123_x.y").map(|id| id.to_string()),
            Some("abc-123_x.y".to_string())
        );
        assert!(RequestId::from_header("").is_none());
        assert!(RequestId::from_header("has space").is_none());
        assert!(RequestId::from_header("line\nbreak").is_none());
        assert!(RequestId::from_header(&"a".repeat(MAX_REQUEST_ID_LEN + 1)).is_none());
    }

    #[tokio::test]
    async fn test_error_body_gets_request_id() {
        let request_id = RequestId::from_header("req-1").unwrap();
        let response = Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, "60")
            .body(Body::from(
                r#"{"error":{"type":"invalid_request_error","message":"bad"}}"#,
            ))
            .unwrap();

        let tagged = tag_error_body(response, &request_id).await;

        assert_eq!(tagged.status(), StatusCode::BAD_REQUEST);
        assert!(tagged.headers().get(CONTENT_LENGTH).is_none());
        let json = json_body(tagged).await;
        assert_eq!(json["error"]["request_id"], "req-1");
        assert_eq!(json["error"]["message"], "bad");
    }

    #[tokio::test]
    async fn test_success_body_untouched() {
        let request_id = RequestId::generate();
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"content":[]}"#))
            .unwrap();

        let json = json_body(tag_error_body(response, &request_id).await).await;

        assert_eq!(json, serde_json::json!({"content": []}));
    }

    #[tokio::test]
    async fn test_non_json_error_untouched() {
        let request_id = RequestId::generate();
        let response = Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("down"))
            .unwrap();

        let tagged = tag_error_body(response, &request_id).await;
        let bytes = tagged.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(bytes.as_ref(), b"down");
    }

    #[tokio::test]
    async fn test_json_error_without_error_object_untouched() {
        let request_id = RequestId::generate();
        let response = Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"error"}"#))
            .unwrap();

        let json = json_body(tag_error_body(response, &request_id).await).await;

        assert_eq!(json, serde_json::json!({"status": "error"}));
    }
}
