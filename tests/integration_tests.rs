//! Integration tests for the gantry adapter.

use bytes::Bytes;
use gantry::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TEST_TIMEOUT: Duration = Duration::from_millis(200);

fn dispatcher(app: impl ChainApp + 'static) -> Dispatcher {
    Dispatcher::new(Arc::new(app)).with_timeout(TEST_TIMEOUT)
}

fn ctx() -> InvocationContext {
    InvocationContext::new("req-123")
}

/// Finalizes through a JSON write after non-terminal refinements.
struct CreatedApp;

#[async_trait]
impl ChainApp for CreatedApp {
    async fn handle(
        &self,
        _request: ChainRequest,
        response: Responder,
        _done: Done,
        ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        response
            .status(StatusCode::CREATED)
            .set("X-Request-Id", &ctx.request_id)
            .json(&json!({ "message": "created" }));
        Ok(())
    }
}

/// Never writes; signals completion without an error.
struct FallthroughApp;

#[async_trait]
impl ChainApp for FallthroughApp {
    async fn handle(
        &self,
        _request: ChainRequest,
        _response: Responder,
        done: Done,
        _ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        done.ok();
        Ok(())
    }
}

/// Sets a header, then signals completion with an error.
struct FailingApp;

#[async_trait]
impl ChainApp for FailingApp {
    async fn handle(
        &self,
        _request: ChainRequest,
        response: Responder,
        done: Done,
        _ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        response.set("X-Trace", "abc");
        done.err(ChainError::new("boom"));
        Ok(())
    }
}

/// Fails by returning an error instead of using the callback.
struct ErrorReturnApp;

#[async_trait]
impl ChainApp for ErrorReturnApp {
    async fn handle(
        &self,
        _request: ChainRequest,
        _response: Responder,
        _done: Done,
        _ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        Err(ChainError::new("exploded"))
    }
}

/// Neither finalizes nor signals completion within the ceiling.
struct StallingApp;

#[async_trait]
impl ChainApp for StallingApp {
    async fn handle(
        &self,
        _request: ChainRequest,
        _response: Responder,
        _done: Done,
        _ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

/// Serves a file from disk.
struct FileApp {
    path: String,
}

#[async_trait]
impl ChainApp for FileApp {
    async fn handle(
        &self,
        _request: ChainRequest,
        response: Responder,
        _done: Done,
        _ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        response.send_file(&self.path).await;
        Ok(())
    }
}

/// Calls two finalizing writes in a row.
struct DoubleSendApp;

#[async_trait]
impl ChainApp for DoubleSendApp {
    async fn handle(
        &self,
        _request: ChainRequest,
        response: Responder,
        _done: Done,
        _ctx: &InvocationContext,
    ) -> Result<(), ChainError> {
        response.json(&json!({ "first": true }));
        response.json(&json!({ "second": true }));
        Ok(())
    }
}

#[tokio::test]
async fn test_parse_query_well_formed() {
    let query = parse_query("/api/redemption-code-status?code=ABC123&page=2");

    assert_eq!(query.get("code"), Some(&"ABC123".to_string()));
    assert_eq!(query.get("page"), Some(&"2".to_string()));
    assert_eq!(query.len(), 2);
}

#[tokio::test]
async fn test_parse_query_absolute_url() {
    let query = parse_query("https://example.com/items?q=rust");

    assert_eq!(query.get("q"), Some(&"rust".to_string()));
}

#[tokio::test]
async fn test_parse_query_malformed_yields_empty() {
    // Unclosed IPv6 literal and a space in the host are both unparseable.
    assert!(parse_query("http://[::1/?q=1").is_empty());
    assert!(parse_query("http://exa mple.com/?q=1").is_empty());
}

#[tokio::test]
async fn test_chain_request_translation() {
    let envelope = Envelope::new(Method::Get, "/users/42?tab=posts&sort=asc")
        .header("Content-Type", "application/json")
        .body(r#"{"key": "value"}"#);

    let request = ChainRequest::from_envelope(envelope);

    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, "/users/42?tab=posts&sort=asc");
    assert_eq!(request.path, "/users/42");
    assert_eq!(request.query.get("tab"), Some(&"posts".to_string()));
    assert_eq!(request.query.get("sort"), Some(&"asc".to_string()));
    assert_eq!(
        request.header("CONTENT-TYPE"),
        Some(&"application/json".to_string())
    );
    assert!(request.body.is_some());
}

#[tokio::test]
async fn test_pre_parsed_query_used_verbatim() {
    let mut parsed = HashMap::new();
    parsed.insert("from_host".to_string(), "yes".to_string());

    let envelope = Envelope::new(Method::Get, "/items?raw=ignored").query(parsed);
    let request = ChainRequest::from_envelope(envelope);

    assert_eq!(request.query.get("from_host"), Some(&"yes".to_string()));
    assert_eq!(request.query.get("raw"), None);
}

#[tokio::test]
async fn test_mime_table() {
    assert_eq!(mime_for_path("public/index.html"), "text/html");
    assert_eq!(mime_for_path("style.CSS"), "text/css");
    assert_eq!(mime_for_path("archive.bin"), "application/octet-stream");
    assert_eq!(mime_for_path("no_extension"), "application/octet-stream");
}

#[tokio::test]
async fn test_responder_records_without_finalizing() {
    let responder = Responder::new();

    responder.status(404u16).set("X-A", "1");

    assert!(!responder.is_terminal());
    let record = responder.snapshot();
    assert_eq!(record.status, StatusCode::NOT_FOUND);
    assert_eq!(record.header("x-a"), Some(&"1".to_string()));
}

#[tokio::test]
async fn test_responder_header_last_write_wins() {
    let responder = Responder::new();

    responder.set("X-Color", "red").set("X-COLOR", "blue");

    let record = responder.snapshot();
    assert_eq!(record.header("x-color"), Some(&"blue".to_string()));
    assert_eq!(record.headers.len(), 1);
}

#[tokio::test]
async fn test_responder_terminal_latch() {
    let responder = Responder::new();

    responder.end();
    assert!(responder.is_terminal());

    // Writes after the latch are recorded but never reopen it.
    responder.status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(responder.is_terminal());
    assert_eq!(
        responder.snapshot().status,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_responder_send_structured_delegates_to_json() {
    let responder = Responder::new();

    responder.send(json!({ "a": 1 }));

    let record = responder.snapshot();
    assert!(record.terminal);
    assert_eq!(
        record.header("content-type"),
        Some(&"application/json".to_string())
    );
    let body: Value = record.json_body().unwrap().unwrap();
    assert_eq!(body["a"], 1);
}

#[tokio::test]
async fn test_responder_send_text_verbatim() {
    let responder = Responder::new();

    responder.send("plain text");

    let record = responder.snapshot();
    assert!(record.terminal);
    assert_eq!(record.text_body(), Some("plain text".to_string()));
    assert_eq!(record.header("content-type"), None);
}

#[tokio::test]
async fn test_responder_redirect() {
    let responder = Responder::new();

    responder.redirect("/login");

    let record = responder.snapshot();
    assert!(record.terminal);
    assert_eq!(record.status, StatusCode::FOUND);
    assert_eq!(record.header("location"), Some(&"/login".to_string()));
}

#[tokio::test]
async fn test_dispatch_terminal() {
    let envelope = Envelope::new(Method::Get, "/things");
    let record = dispatcher(CreatedApp).dispatch(envelope, ctx()).await;

    assert_eq!(record.status, StatusCode::CREATED);
    assert_eq!(record.header("x-request-id"), Some(&"req-123".to_string()));
    let body: Value = record.json_body().unwrap().unwrap();
    assert_eq!(body["message"], "created");
}

#[tokio::test]
async fn test_dispatch_fallthrough_resolves_without_error() {
    let envelope = Envelope::new(Method::Get, "/api/redemption-code-status?code=ABC123");
    let record = dispatcher(FallthroughApp).dispatch(envelope, ctx()).await;

    assert_eq!(record.status, StatusCode::OK);
    assert!(record.body.is_none());
    assert!(!record.terminal);
}

#[tokio::test]
async fn test_dispatch_chain_error() {
    let envelope = Envelope::new(Method::Get, "/boom");
    let record = dispatcher(FailingApp).dispatch(envelope, ctx()).await;

    assert_eq!(record.status, StatusCode::INTERNAL_SERVER_ERROR);
    // Headers written before the failure still apply.
    assert_eq!(record.header("x-trace"), Some(&"abc".to_string()));
    let body: Value = record.json_body().unwrap().unwrap();
    assert_eq!(body["error"], "boom");
}

#[tokio::test]
async fn test_dispatch_error_return() {
    let envelope = Envelope::new(Method::Get, "/explode");
    let record = dispatcher(ErrorReturnApp).dispatch(envelope, ctx()).await;

    assert_eq!(record.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = record.json_body().unwrap().unwrap();
    assert_eq!(body["error"], "exploded");
}

#[tokio::test]
async fn test_dispatch_timeout() {
    let envelope = Envelope::new(Method::Get, "/slow");
    let record = dispatcher(StallingApp).dispatch(envelope, ctx()).await;

    assert_eq!(record.status, StatusCode::GATEWAY_TIMEOUT);
    let body: Value = record.json_body().unwrap().unwrap();
    assert_eq!(body["error"], "gateway timeout");
    assert_eq!(body["timed_out"], true);
}

#[tokio::test]
async fn test_dispatch_double_terminal_keeps_last_write() {
    let envelope = Envelope::new(Method::Get, "/twice");
    let record = dispatcher(DoubleSendApp).dispatch(envelope, ctx()).await;

    assert!(record.terminal);
    let body: Value = record.json_body().unwrap().unwrap();
    assert_eq!(body["second"], true);
    assert_eq!(body.get("first"), None);
}

#[tokio::test]
async fn test_send_file_html() {
    let path = std::env::temp_dir().join("gantry_send_file_test.html");
    let contents = "<!DOCTYPE html><h1>hello</h1>";
    std::fs::write(&path, contents).unwrap();

    let app = FileApp {
        path: path.to_string_lossy().to_string(),
    };
    let envelope = Envelope::new(Method::Get, "/");
    let record = dispatcher(app).dispatch(envelope, ctx()).await;

    assert_eq!(record.status, StatusCode::OK);
    assert_eq!(record.header("content-type"), Some(&"text/html".to_string()));
    assert_eq!(record.text_body(), Some(contents.to_string()));
}

#[tokio::test]
async fn test_send_file_missing() {
    let app = FileApp {
        path: "/definitely/not/here.html".to_string(),
    };
    let envelope = Envelope::new(Method::Get, "/");
    let record = dispatcher(app).dispatch(envelope, ctx()).await;

    assert_eq!(record.status, StatusCode::NOT_FOUND);
    assert_eq!(
        record.header("content-type"),
        Some(&"application/json".to_string())
    );
    let body: Value = record.json_body().unwrap().unwrap();
    assert!(body["error"].as_str().unwrap().contains("file not found"));
}

#[tokio::test]
async fn test_into_result_substitutes_default_json_body() {
    let responder = Responder::new();
    responder.set("Content-Type", "application/json");

    let result = into_result(responder.snapshot());

    assert_eq!(result.status, 200);
    let body: Value = serde_json::from_slice(&result.body).unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_into_result_keeps_empty_body_without_json() {
    let responder = Responder::new();

    let result = into_result(responder.snapshot());

    assert_eq!(result.status, 200);
    assert!(result.body.is_empty());
}

#[derive(Default)]
struct MockChannel {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    sends: usize,
}

impl ResponseChannel for MockChannel {
    fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    fn set_header(&mut self, key: &str, value: &str) {
        self.headers.push((key.to_string(), value.to_string()));
    }

    fn send(&mut self, body: Bytes) {
        self.sends += 1;
        self.body = Some(body);
    }
}

#[tokio::test]
async fn test_commit_to_channel() {
    let responder = Responder::new();
    responder.status(204u16).set("X-Done", "yes").end();

    let mut channel = MockChannel::default();
    commit(responder.snapshot(), &mut channel);

    assert_eq!(channel.status, Some(204));
    assert!(channel
        .headers
        .iter()
        .any(|(k, v)| k == "X-Done" && v == "yes"));
    assert_eq!(channel.sends, 1);
}

#[tokio::test]
async fn test_chain_error_conversion() {
    let error = ChainError::not_found("missing");
    let record: ResponseRecord = error.into();

    assert_eq!(record.status, StatusCode::NOT_FOUND);
    assert!(record.terminal);
    let body: Value = record.json_body().unwrap().unwrap();
    assert_eq!(body["error"], "missing");
}

#[tokio::test]
async fn test_invocation_context() {
    let ctx = InvocationContext::new("req-456")
        .with_env("API_KEY", "secret123")
        .with_client_ip("203.0.113.9");

    assert_eq!(ctx.request_id, "req-456");
    assert_eq!(ctx.get_env("API_KEY"), Some(&"secret123".to_string()));
    assert_eq!(ctx.get_env("NONEXISTENT"), None);
    assert_eq!(ctx.client_ip, Some("203.0.113.9".to_string()));
}

#[tokio::test]
async fn test_status_code_helpers() {
    assert!(StatusCode::OK.is_success());
    assert!(StatusCode::FOUND.is_redirect());
    assert!(StatusCode::NOT_FOUND.is_client_error());
    assert!(StatusCode::GATEWAY_TIMEOUT.is_server_error());
    assert!(!StatusCode::OK.is_server_error());
}

#[tokio::test]
async fn test_config_builder() {
    let config = GantryConfig::new()
        .host("127.0.0.1")
        .port(9000)
        .chain_timeout(5)
        .env("ENVIRONMENT", "test");

    assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    assert_eq!(config.chain_timeout_duration(), Duration::from_secs(5));
    assert_eq!(config.env.get("ENVIRONMENT"), Some(&"test".to_string()));
}

#[tokio::test]
async fn test_method_display() {
    assert_eq!(Method::Get.to_string(), "GET");
    assert_eq!(Method::Post.to_string(), "POST");
    assert_eq!(Method::from("delete"), Method::Delete);
}
