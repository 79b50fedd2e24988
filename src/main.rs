//! Gantry Runtime - Example Host Server
//!
//! This example wires a small middleware-chain application into the
//! gantry host: cross-cutting headers applied from configuration data,
//! a JSON status route, a static file route, and a fall-through.

use gantry::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Cross-cutting policy data the chain applies to every response.
/// Adjustable configuration, not adapter logic.
struct PolicyConfig {
    allowed_origin: String,
    security_headers: Vec<(String, String)>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
            security_headers: vec![
                ("X-Content-Type-Options".to_string(), "nosniff".to_string()),
                ("X-Frame-Options".to_string(), "DENY".to_string()),
                ("Referrer-Policy".to_string(), "no-referrer".to_string()),
            ],
        }
    }
}

/// Example middleware-chain application.
struct DemoApp {
    policy: PolicyConfig,
    index_path: String,
}

#[async_trait]
impl ChainApp for DemoApp {
    async fn handle(
        &self,
        request: ChainRequest,
        response: Responder,
        done: Done,
        ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        // Cross-cutting headers first, the way middleware would run
        // ahead of the route handlers.
        for (key, value) in &self.policy.security_headers {
            response.set(key, value);
        }
        response.set("Access-Control-Allow-Origin", &self.policy.allowed_origin);

        match (request.method.clone(), request.path.as_str()) {
            (Method::Get, "/") => {
                response.send_file(&self.index_path).await;
            }
            (Method::Get, "/api/status") => {
                response.json(&serde_json::json!({
                    "status": "ok",
                    "request_id": ctx.request_id,
                    "client_ip": ctx.client_ip,
                }));
            }
            (Method::Get, "/api/echo") => {
                response.json(&serde_json::json!({
                    "query": request.query,
                    "url": request.url,
                }));
            }
            (Method::Get, "/docs") => {
                response.redirect("/");
            }
            // Unmatched routes fall through; the host commits the
            // record as it stands.
            _ => done.ok(),
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting gantry host server...");

    let config = GantryConfig::new()
        .host("0.0.0.0")
        .port(8080)
        .chain_timeout(10)
        .env("ENVIRONMENT", "development");

    let app = DemoApp {
        policy: PolicyConfig::default(),
        index_path: "public/index.html".to_string(),
    };

    let server = GantryServer::new(config, Arc::new(app));

    tracing::info!("Try: curl http://localhost:8080/");
    tracing::info!("Try: curl http://localhost:8080/api/status");
    tracing::info!("Try: curl 'http://localhost:8080/api/echo?code=ABC123'");
    tracing::info!("Health check: curl http://localhost:8080/_health");

    server.run().await
}
