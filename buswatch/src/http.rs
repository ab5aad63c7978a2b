//! JSON-over-HTTP transport shared by the WebDriver and Discord adapters.
//!
//! Both adapters speak JSON request/response pairs. Putting the wire behind
//! [`JsonTransport`] lets their protocol logic run against a scripted
//! transport in tests.

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// A request failed before a response arrived.
#[derive(Debug, Clone, Error)]
#[error("request to {url} failed: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

/// One outgoing request.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    pub method: Method,
    pub url: String,
    /// Value for the `Authorization` header.
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl JsonRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            authorization: None,
            body: None,
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and raw body of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Sends JSON requests.
pub trait JsonTransport: Send + Sync + fmt::Debug {
    fn send(&self, request: JsonRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// [`JsonTransport`] over a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl JsonTransport for ReqwestTransport {
    fn send(&self, request: JsonRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let JsonRequest {
                method,
                url,
                authorization,
                body,
            } = request;
            let fail = |e: reqwest::Error| TransportError {
                url: url.clone(),
                message: e.to_string(),
            };

            let mut builder = self.client.request(method, &url);
            if let Some(value) = authorization {
                builder = builder.header(reqwest::header::AUTHORIZATION, value);
            }
            if let Some(body) = body {
                builder = builder.json(&body);
            }

            let response = builder.send().await.map_err(fail)?;
            let status = response.status();
            let body = response.text().await.map_err(fail)?;

            Ok(HttpResponse { status, body })
        })
    }
}
