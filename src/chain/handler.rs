//! Middleware-chain application contract, invocation context and errors.

use crate::adapter::Responder;
use crate::http::{ChainRequest, ResponseRecord, StatusCode};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Per-invocation context passed through to the chain unmodified.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Environment variables available to the chain.
    pub env: HashMap<String, String>,
    /// Request ID for tracing.
    pub request_id: String,
    /// Client IP hint supplied by the host, if known.
    pub client_ip: Option<String>,
}

impl InvocationContext {
    /// Create a new invocation context.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            env: HashMap::new(),
            request_id: request_id.into(),
            client_ip: None,
        }
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Attach the client IP hint.
    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    /// Get an environment variable.
    pub fn get_env(&self, key: &str) -> Option<&String> {
        self.env.get(key)
    }
}

/// The wrapped middleware-chain application.
///
/// An implementation must do at least one of the following per
/// invocation: call a finalizing method on the [`Responder`], fire the
/// [`Done`] callback (with or without an error), or return `Err`.
/// Whichever signal arrives first governs the invocation's outcome;
/// the rest are ignored. Implementations are shared across concurrent
/// invocations and must not mutate their own state after startup.
#[async_trait]
pub trait ChainApp: Send + Sync {
    /// Process one invocation.
    async fn handle(
        &self,
        request: ChainRequest,
        response: Responder,
        done: Done,
        ctx: &InvocationContext,
    ) -> Result<(), ChainError>;
}

/// Chain execution error.
#[derive(Debug, Clone)]
pub struct ChainError {
    /// Error message.
    pub message: String,
    /// Suggested HTTP status code.
    pub code: u16,
}

impl ChainError {
    /// Create a new ChainError with an internal-error code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 500,
        }
    }

    /// Create a ChainError with a specific code.
    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(404, message)
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code(400, message)
    }
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::new(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::bad_request(err.to_string())
    }
}

impl From<ChainError> for ResponseRecord {
    fn from(err: ChainError) -> Self {
        let mut record = ResponseRecord::new();
        record.force_error(StatusCode(err.code), &err.message);
        record
    }
}

/// Resolution signal for one invocation. The chain's two "done" paths,
/// finalizing writes and the completion callback, funnel into a single
/// ordered channel; the coordinator acts on the first signal only.
#[derive(Debug)]
pub(crate) enum Signal {
    /// A finalizing write occurred on the responder.
    Terminal,
    /// The completion callback fired, possibly with an error.
    Completed(Option<ChainError>),
}

/// Completion callback handed to the chain.
///
/// Fire-and-forget: only the first signal per invocation is observed,
/// and firing after the invocation has resolved is a no-op.
#[derive(Debug, Clone)]
pub struct Done {
    tx: mpsc::UnboundedSender<Signal>,
}

impl Done {
    /// Create a callback wired to the invocation's resolution channel.
    pub(crate) fn with_signal(tx: mpsc::UnboundedSender<Signal>) -> Self {
        Self { tx }
    }

    /// Signal that the chain finished without an error.
    pub fn ok(&self) {
        let _ = self.tx.send(Signal::Completed(None));
    }

    /// Signal that the chain failed.
    pub fn err(&self, error: ChainError) {
        let _ = self.tx.send(Signal::Completed(Some(error)));
    }
}
