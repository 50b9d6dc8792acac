//! Remote API transport
//!
//! Requests are described as [`ApiRequest`] values so the orchestrator can be
//! exercised against [`MockTransport`](crate::testing::MockTransport); the
//! production [`HttpTransport`] sends them with reqwest.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use crate::config::Settings;
use crate::error::{AppError, AppResult, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        })
    }
}

/// One outbound call, relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base, without a leading slash
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Raw session token sent as the `Authorization` header
    pub token: Option<String>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `"GET stats/species"`: method plus path, ignoring query and body
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Percent-encoded query string, if any
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        Some(
            self.query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&"),
        )
    }
}

#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform one request and return the decoded JSON body.
    ///
    /// Non-2xx answers are [`AppError::Transport`] with the status set; a
    /// body that is not JSON is [`AppError::MalformedResponse`].
    async fn send(&self, request: ApiRequest) -> AppResult<Value>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> AppResult<Self> {
        let mut raw = settings.api_base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|e| AppError::Config(format!("invalid api_base_url {raw:?}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, request: &ApiRequest) -> AppResult<Url> {
        let mut url = self
            .base
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError::network(format!("invalid path {:?}: {e}", request.path)))?;
        url.set_query(request.query_string().as_deref());
        Ok(url)
    }
}

fn server_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<Value> {
        let url = self.url_for(&request)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &request.token {
            builder = builder.header(AUTHORIZATION, token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(route = %request.route(), "Sending request");
        let response = builder.send().await.map_err(|e| {
            TransportError::new(e.status().map(|s| s.as_u16()), e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("request failed");
            let message = server_message(&body, fallback);
            return Err(TransportError::new(Some(status.as_u16()), message).into());
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| AppError::malformed(format!("{}: {e}", request.route())))
    }
}
