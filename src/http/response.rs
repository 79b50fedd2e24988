//! The response record built up over one invocation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);
    pub const GATEWAY_TIMEOUT: StatusCode = StatusCode(504);

    /// Check if the status code indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Check if the status code indicates a redirect (3xx).
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.0)
    }

    /// Check if the status code indicates a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Check if the status code indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

/// Everything the middleware chain wrote during one invocation.
///
/// The record starts `open` and flips to `terminal` on the first
/// finalizing write. Later writes are still recorded (last write wins
/// per header key) but the record never reopens; what the platform
/// observes is the snapshot taken at resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// HTTP status code.
    pub status: StatusCode,
    /// HTTP headers, last write wins per case-insensitive key.
    pub headers: HashMap<String, String>,
    /// Response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Bytes>,
    /// Whether a finalizing write has occurred.
    pub terminal: bool,
}

impl ResponseRecord {
    /// Create a fresh record for a new invocation.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HashMap::new(),
            body: None,
            terminal: false,
        }
    }

    /// Insert a header, replacing any existing key that matches
    /// case-insensitively.
    pub fn insert_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value.into());
    }

    /// Get a header value, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Force the record into an error shape: the given status and a
    /// structured `{"error": message}` body.
    pub fn force_error(&mut self, status: StatusCode, message: &str) {
        self.status = status;
        self.insert_header("Content-Type", "application/json");
        self.body = Some(Bytes::from(
            serde_json::json!({ "error": message }).to_string(),
        ));
        self.terminal = true;
    }

    /// Force the record into the timeout shape, distinguishable from
    /// chain errors by status and body.
    pub fn force_timeout(&mut self) {
        self.status = StatusCode::GATEWAY_TIMEOUT;
        self.insert_header("Content-Type", "application/json");
        self.body = Some(Bytes::from(
            serde_json::json!({ "error": "gateway timeout", "timed_out": true }).to_string(),
        ));
        self.terminal = true;
    }

    /// Get the body as text if present.
    pub fn text_body(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Parse the body as JSON if present.
    pub fn json_body<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Option<Result<T, serde_json::Error>> {
        self.body.as_ref().map(|b| serde_json::from_slice(b))
    }
}

impl Default for ResponseRecord {
    fn default() -> Self {
        Self::new()
    }
}
