//! # Gantry - Middleware-Chain Host Adapter
//!
//! Gantry lets a framework-style HTTP application, built from composable
//! middleware, run inside a host runtime that invokes handlers through a
//! single-function calling convention instead of owning the socket
//! lifecycle. The adapter translates the platform's request shape into
//! the shape the chain expects, records everything the chain writes to
//! the response, and resolves each invocation exactly once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Host Runtime                                │
//! │              (connections, HTTP parsing, TLS)                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                   │  (request, context)
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           Gantry                                    │
//! │   Envelope ──► ChainRequest ──► ┌───────────────────────────┐      │
//! │                                 │     Middleware Chain       │      │
//! │   InvocationResult ◄── Record ◄─┤  (opaque ChainApp object)  │      │
//! │                                 └───────────────────────────┘      │
//! │        first of {terminal write, done callback, timeout} wins      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gantry::prelude::*;
//! use std::sync::Arc;
//!
//! struct HelloApp;
//!
//! #[async_trait]
//! impl ChainApp for HelloApp {
//!     async fn handle(
//!         &self,
//!         request: ChainRequest,
//!         response: Responder,
//!         done: Done,
//!         _ctx: &InvocationContext,
//!     ) -> Result<(), ChainError> {
//!         match request.path.as_str() {
//!             "/hello" => {
//!                 response.json(&serde_json::json!({ "message": "Hello from gantry!" }));
//!             }
//!             // Unmatched paths fall through; the host commits whatever
//!             // the record holds.
//!             _ => done.ok(),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let server = GantryServer::with_defaults(Arc::new(HelloApp));
//!     server.run().await
//! }
//! ```
//!
//! ## Invocation Lifecycle
//!
//! 1. **Translate**: the platform request becomes an [`http::Envelope`],
//!    then a [`http::ChainRequest`] with a parsed query mapping and
//!    case-insensitive header lookup.
//! 2. **Run**: the chain receives the request, a [`adapter::Responder`]
//!    in place of the native response, and a [`chain::Done`] callback.
//! 3. **Resolve**: whichever fires first — a finalizing write, the
//!    callback, or the timeout ceiling — settles the invocation; the
//!    other triggers are ignored.
//! 4. **Commit**: the resolved record is materialized exactly once,
//!    either as a returned [`adapter::InvocationResult`] or onto a
//!    native [`adapter::ResponseChannel`].
//!
//! Failures at every stage degrade to well-formed HTTP error responses;
//! the host runtime never observes an adapter-internal error.

pub mod adapter;
pub mod chain;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::adapter::{
        commit, into_result, Dispatcher, InvocationResult, Payload, Responder, ResponseChannel,
        DEFAULT_CHAIN_TIMEOUT,
    };
    pub use crate::chain::{ChainApp, ChainError, Done, InvocationContext};
    pub use crate::http::{
        mime_for_path, parse_query, ChainRequest, Envelope, Method, ResponseRecord, StatusCode,
    };
    pub use crate::runtime::{GantryConfig, GantryServer};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use adapter::{Dispatcher, InvocationResult, Responder};
pub use chain::{ChainApp, ChainError, Done, InvocationContext};
pub use http::{ChainRequest, Envelope, ResponseRecord};
pub use runtime::{GantryConfig, GantryServer};
