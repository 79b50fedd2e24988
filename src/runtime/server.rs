//! Gantry host server: the platform side of the adaptation boundary.
//!
//! Owns connections and HTTP parsing, converts each hyper request into
//! an [`Envelope`], runs it through the [`Dispatcher`], and writes the
//! resulting [`InvocationResult`] back out. This host uses the
//! returned-value convention exclusively.

use crate::adapter::{into_result, Dispatcher, InvocationResult};
use crate::chain::{ChainApp, ChainError, InvocationContext};
use crate::http::{Envelope, Method, ResponseRecord};
use crate::runtime::GantryConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Gantry host server.
///
/// Holds the one shared chain application, read-only after startup;
/// every invocation gets fresh request and response objects.
pub struct GantryServer {
    /// Server configuration.
    config: GantryConfig,
    /// Invocation coordinator around the shared chain app.
    dispatcher: Arc<Dispatcher>,
}

impl GantryServer {
    /// Create a new host server around a chain application.
    pub fn new(config: GantryConfig, app: Arc<dyn ChainApp>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(app).with_timeout(config.chain_timeout_duration()));
        Self { config, dispatcher }
    }

    /// Create a host server with default configuration.
    pub fn with_defaults(app: Arc<dyn ChainApp>) -> Self {
        Self::new(GantryConfig::default(), app)
    }

    /// Start the HTTP server.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Gantry server listening on {}", addr);

        let dispatcher = self.dispatcher.clone();
        let config = self.config.clone();

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let dispatcher = dispatcher.clone();
            let config = config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let dispatcher = dispatcher.clone();
                    let config = config.clone();
                    async move { handle_request(req, dispatcher, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    dispatcher: Arc<Dispatcher>,
    config: GantryConfig,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    let request_id = generate_request_id();

    debug!(
        "Handling request: {} {} from {} [{}]",
        method, path, remote_addr, request_id
    );

    if config.enable_health && path == "/_health" {
        let mut record = ResponseRecord::new();
        record.insert_header("Content-Type", "text/plain");
        record.body = Some(Bytes::from_static(b"OK"));
        return Ok(build_response(into_result(record)));
    }

    let envelope = match convert_request(req, &config).await {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Failed to convert request: {} [{}]", e, request_id);
            let record = ResponseRecord::from(ChainError::bad_request(e.to_string()));
            return Ok(build_response(into_result(record)));
        }
    };

    let mut ctx = InvocationContext::new(&request_id).with_client_ip(remote_addr.ip().to_string());
    ctx.env.extend(config.env.clone());

    let record = dispatcher.dispatch(envelope, ctx).await;
    Ok(build_response(into_result(record)))
}

/// Convert a hyper Request to an Envelope.
async fn convert_request(
    req: Request<Incoming>,
    config: &GantryConfig,
) -> Result<Envelope, Box<dyn std::error::Error + Send + Sync>> {
    let method = Method::from(req.method());
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut headers = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            // hyper header names are already lowercase
            headers.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let body_bytes = req.collect().await?.to_bytes();
    let body = if body_bytes.len() > config.max_body_size {
        return Err("Request body too large".into());
    } else if body_bytes.is_empty() {
        None
    } else {
        Some(body_bytes)
    };

    Ok(Envelope {
        method,
        target,
        headers,
        body,
        query: None,
    })
}

/// Build a hyper Response from an InvocationResult.
fn build_response(result: InvocationResult) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(result.status).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            result.status
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);

    for (name, value) in result.headers {
        builder = builder.header(name, value);
    }

    match builder.body(Full::new(result.body)) {
        Ok(response) => response,
        Err(err) => {
            error!("Failed to build response: {}", err);
            Response::builder()
                .status(hyper::StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"error":"response build failed"}"#,
                )))
                .unwrap()
        }
    }
}

/// Generate a unique request ID.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:x}", timestamp)
}
