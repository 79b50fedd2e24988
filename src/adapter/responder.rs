//! The response adapter handed to the middleware chain.

use crate::chain::Signal;
use crate::http::{mime_for_path, ResponseRecord, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Body payload accepted by [`Responder::send`] and
/// [`Responder::end_with`].
#[derive(Debug, Clone)]
pub enum Payload {
    /// A structured value, serialized as JSON.
    Json(serde_json::Value),
    /// A text body, written verbatim.
    Text(String),
    /// A binary body, written verbatim.
    Binary(Bytes),
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Binary(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(bytes))
    }
}

struct ResponderInner {
    record: Mutex<ResponseRecord>,
    signals: mpsc::UnboundedSender<Signal>,
}

/// Records every mutation the middleware chain issues against the
/// response, in place of the platform's native response object.
///
/// Cloning yields another handle to the same record, so the chain can
/// pass the responder through its middleware stack freely. The record
/// starts `open`; the first finalizing call (`json`, `send`, `end`,
/// `redirect`, `send_file`) flips it to `terminal` and signals the
/// coordinator. Calls after that are still recorded but never reopen
/// the record.
#[derive(Clone)]
pub struct Responder {
    inner: Arc<ResponderInner>,
}

impl Responder {
    /// Create a standalone responder with no coordinator attached.
    pub fn new() -> Self {
        let (signals, _) = mpsc::unbounded_channel();
        Self::with_signal(signals)
    }

    /// Create a responder wired to the invocation's resolution channel.
    pub(crate) fn with_signal(signals: mpsc::UnboundedSender<Signal>) -> Self {
        Self {
            inner: Arc::new(ResponderInner {
                record: Mutex::new(ResponseRecord::new()),
                signals,
            }),
        }
    }

    fn record(&self) -> MutexGuard<'_, ResponseRecord> {
        self.inner
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a finalizing mutation. Only the open→terminal transition
    /// emits a signal; the state is absorbing.
    fn finalize(&self, mutate: impl FnOnce(&mut ResponseRecord)) {
        let mut record = self.record();
        let first = !record.terminal;
        mutate(&mut record);
        record.terminal = true;
        drop(record);
        if first {
            let _ = self.inner.signals.send(Signal::Terminal);
        }
    }

    /// Whether a finalizing call has occurred.
    pub fn is_terminal(&self) -> bool {
        self.record().terminal
    }

    /// Clone the record as currently written.
    pub fn snapshot(&self) -> ResponseRecord {
        self.record().clone()
    }

    /// Set the status code. Chainable, not finalizing.
    pub fn status(&self, code: impl Into<StatusCode>) -> &Self {
        self.record().status = code.into();
        self
    }

    /// Set a header, last write wins per case-insensitive key.
    /// Chainable, not finalizing.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> &Self {
        self.record().insert_header(key, value);
        self
    }

    /// Alias for [`set`](Responder::set).
    pub fn set_header(&self, key: impl Into<String>, value: impl Into<String>) -> &Self {
        self.set(key, value)
    }

    /// Serialize a payload as the JSON response body and finalize.
    ///
    /// A payload that fails to serialize degrades to a structured
    /// internal error; it never propagates.
    pub fn json<T: Serialize>(&self, payload: &T) -> &Self {
        match serde_json::to_vec(payload) {
            Ok(body) => {
                self.finalize(|record| {
                    record.insert_header("Content-Type", "application/json");
                    record.body = Some(Bytes::from(body));
                });
            }
            Err(err) => {
                error!("Response payload serialization failed: {}", err);
                self.finalize(|record| {
                    record.force_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "response serialization failed",
                    );
                });
            }
        }
        self
    }

    /// Write a payload as the response body and finalize. Structured
    /// payloads are routed through [`json`](Responder::json); text and
    /// binary payloads are written verbatim.
    pub fn send(&self, payload: impl Into<Payload>) -> &Self {
        match payload.into() {
            Payload::Json(value) => {
                self.json(&value);
            }
            Payload::Text(text) => {
                self.finalize(|record| record.body = Some(Bytes::from(text)));
            }
            Payload::Binary(bytes) => {
                self.finalize(|record| record.body = Some(bytes));
            }
        }
        self
    }

    /// Finalize the response as currently recorded.
    pub fn end(&self) -> &Self {
        self.finalize(|_| {});
        self
    }

    /// Write a final payload and finalize; equivalent to
    /// [`send`](Responder::send).
    pub fn end_with(&self, payload: impl Into<Payload>) -> &Self {
        self.send(payload)
    }

    /// Redirect to `location` and finalize.
    pub fn redirect(&self, location: impl Into<String>) -> &Self {
        let location = location.into();
        self.finalize(|record| {
            record.status = StatusCode::FOUND;
            record.insert_header("Location", location);
        });
        self
    }

    /// Read a file and send its contents with a MIME type inferred from
    /// the extension. An unreadable file degrades to a structured
    /// not-found response; it never propagates.
    pub async fn send_file(&self, path: &str) -> &Self {
        match tokio::fs::read(path).await {
            Ok(contents) => {
                self.set("Content-Type", mime_for_path(path));
                self.send(Bytes::from(contents));
            }
            Err(err) => {
                warn!("Failed to read file '{}': {}", path, err);
                self.status(StatusCode::NOT_FOUND).json(&serde_json::json!({
                    "error": format!("file not found: {}", path),
                }));
            }
        }
        self
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}
