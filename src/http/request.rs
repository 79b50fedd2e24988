//! Inbound envelope and the synthetic request handed to the middleware chain.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use url::Url;

/// Base prepended to scheme-less request targets so a full URL parser
/// can operate on them.
const PLACEHOLDER_ORIGIN: &str = "http://gantry.invalid";

/// HTTP method enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
            Method::Patch => write!(f, "PATCH"),
            Method::Head => write!(f, "HEAD"),
            Method::Options => write!(f, "OPTIONS"),
        }
    }
}

impl From<&hyper::Method> for Method {
    fn from(method: &hyper::Method) -> Self {
        match *method {
            hyper::Method::GET => Method::Get,
            hyper::Method::POST => Method::Post,
            hyper::Method::PUT => Method::Put,
            hyper::Method::DELETE => Method::Delete,
            hyper::Method::PATCH => Method::Patch,
            hyper::Method::HEAD => Method::Head,
            hyper::Method::OPTIONS => Method::Options,
            _ => Method::Get,
        }
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            _ => Method::Get,
        }
    }
}

/// Platform-native request snapshot for one invocation.
///
/// Header keys are stored lowercase so lookups are case-insensitive.
/// If the host platform already parsed the query string, `query` holds
/// the result and is used verbatim during translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// HTTP method.
    pub method: Method,
    /// Request target: path plus optional raw query string.
    pub target: String,
    /// HTTP headers, keyed lowercase.
    pub headers: HashMap<String, String>,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Bytes>,
    /// Query parameters pre-parsed by the host, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<HashMap<String, String>>,
}

impl Envelope {
    /// Create a new envelope.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HashMap::new(),
            body: None,
            query: None,
        }
    }

    /// Add a header. The key is normalized to lowercase.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach query parameters already parsed by the host.
    pub fn query(mut self, query: HashMap<String, String>) -> Self {
        self.query = Some(query);
        self
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}

/// The synthetic request a middleware-chain application expects.
///
/// A read-only reshaping of an [`Envelope`]: the full `url`, the `path`
/// without its query string, the parsed `query` mapping, and the
/// case-insensitive [`header`](ChainRequest::header) getter.
#[derive(Debug, Clone)]
pub struct ChainRequest {
    /// HTTP method.
    pub method: Method,
    /// Request target as received: path plus query string.
    pub url: String,
    /// Path component only.
    pub path: String,
    /// Parsed query parameters.
    pub query: HashMap<String, String>,
    /// HTTP headers, keyed lowercase.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Bytes>,
}

impl ChainRequest {
    /// Build the synthetic request for one invocation.
    ///
    /// Pre-parsed query parameters on the envelope win over the raw
    /// query string; otherwise the target is parsed with
    /// [`parse_query`].
    pub fn from_envelope(envelope: Envelope) -> Self {
        let path = envelope
            .target
            .split('?')
            .next()
            .unwrap_or(envelope.target.as_str())
            .to_string();

        let query = match envelope.query {
            Some(parsed) => parsed,
            None => parse_query(&envelope.target),
        };

        Self {
            method: envelope.method,
            url: envelope.target,
            path,
            query,
            headers: envelope.headers,
            body: envelope.body,
        }
    }

    /// Get a header value, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(&key.to_ascii_lowercase())
    }

    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Parse the body as JSON if present.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body.as_ref().map(|b| serde_json::from_slice(b))
    }
}

/// Extract query parameters from a request target.
///
/// Targets without a scheme marker are parsed relative to a placeholder
/// origin. Malformed targets yield an empty mapping rather than an
/// error; the invocation proceeds without query parameters.
pub fn parse_query(target: &str) -> HashMap<String, String> {
    let absolute = if target.contains("://") {
        target.to_string()
    } else if target.starts_with('/') {
        format!("{}{}", PLACEHOLDER_ORIGIN, target)
    } else {
        format!("{}/{}", PLACEHOLDER_ORIGIN, target)
    };

    match Url::parse(&absolute) {
        Ok(parsed) => parsed.query_pairs().into_owned().collect(),
        Err(err) => {
            warn!("Failed to parse request target '{}': {}", target, err);
            HashMap::new()
        }
    }
}
