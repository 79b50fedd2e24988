//! Materializing a resolved record onto the platform boundary.
//!
//! Hosts expose one of two outbound conventions: a returned value
//! carrying status, headers and body, or a native response channel the
//! adapter mutates directly. Each invocation uses exactly one of them;
//! both entry points consume the record by value, so committing the
//! same invocation twice does not type-check.

use crate::http::ResponseRecord;
use bytes::Bytes;
use std::collections::HashMap;

/// Body substituted when a JSON response resolves with nothing in it.
const DEFAULT_JSON_BODY: &[u8] = br#"{"success":true}"#;

/// The returned-value outbound convention.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// HTTP status code.
    pub status: u16,
    /// HTTP headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

/// The platform-sink outbound convention: the minimal primitives a
/// native response channel exposes.
pub trait ResponseChannel {
    /// Set the response status code.
    fn set_status(&mut self, status: u16);
    /// Set a response header.
    fn set_header(&mut self, key: &str, value: &str);
    /// Write the response body, completing the response.
    fn send(&mut self, body: Bytes);
}

fn materialize_body(record: &ResponseRecord) -> Bytes {
    let is_json = record
        .header("Content-Type")
        .map(|value| value.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    match &record.body {
        Some(body) if !body.is_empty() => body.clone(),
        _ if is_json => Bytes::from_static(DEFAULT_JSON_BODY),
        _ => Bytes::new(),
    }
}

/// Commit a resolved record as a returned value.
pub fn into_result(record: ResponseRecord) -> InvocationResult {
    let body = materialize_body(&record);
    InvocationResult {
        status: record.status.into(),
        headers: record.headers,
        body,
    }
}

/// Commit a resolved record onto a native response channel.
pub fn commit(record: ResponseRecord, channel: &mut dyn ResponseChannel) {
    let body = materialize_body(&record);
    channel.set_status(record.status.into());
    for (key, value) in &record.headers {
        channel.set_header(key, value);
    }
    channel.send(body);
}
