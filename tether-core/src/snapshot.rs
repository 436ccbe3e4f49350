use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::response::Parts;
use http::{HeaderMap, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Immutable copy of a network response, as stored in a cache generation.
///
/// Only the status line, headers and fully buffered body are kept; protocol
/// version and extensions of the original response are dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    body: Bytes,
    stored_at: DateTime<Utc>,
}

impl ResponseSnapshot {
    /// Captures a snapshot taken now.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            stored_at: Utc::now(),
        }
    }

    /// Captures a snapshot from response head parts and a buffered body.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self::new(parts.status, parts.headers.clone(), body)
    }

    /// Response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Buffered response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// When the snapshot was captured.
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Rebuilds an HTTP response from the snapshot.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;

    #[test]
    fn into_response_preserves_head_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        let snapshot = ResponseSnapshot::new(StatusCode::OK, headers, "<h1>inbox</h1>");

        let response = snapshot.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(response.body(), &Bytes::from_static(b"<h1>inbox</h1>"));
    }

    #[test]
    fn serde_keeps_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-device", HeaderValue::from_static("pixel"));
        let snapshot = ResponseSnapshot::new(StatusCode::OK, headers, "[]");

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: ResponseSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}
