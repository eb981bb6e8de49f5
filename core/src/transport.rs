//! The I/O seam between the clients and the network.
//!
//! # Design
//! Clients never touch a socket directly: they build an `HttpRequest` and
//! hand it to a `Transport`. `ReqwestTransport` is the production
//! implementation; tests substitute scripted transports. A transport
//! returns `Err` only when no response exists at all. Once a status line
//! has been received the call yields an `HttpResponse`, even if reading
//! the body fails midway.

use std::future::Future;
use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use crate::error::NetworkFailure;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one request against the network.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, NetworkFailure>> + Send;
}

/// `Transport` backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, NetworkFailure> {
        let client = reqwest::Client::builder()
            .user_agent(format!("roadtrack/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkFailure::with_cause("failed to build HTTP client", e))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, NetworkFailure> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| {
                NetworkFailure::with_cause(format!("request to {} failed", request.url), e)
            })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "failed to read response body");
                String::new()
            }
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

impl<X: Transport> Transport for Arc<X> {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, NetworkFailure>> + Send {
        (**self).execute(request)
    }
}
