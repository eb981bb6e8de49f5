//! Backend clients for the browser and server execution contexts.
//!
//! # Design
//! Both clients split a call into `build_request` (pure, produces an
//! `HttpRequest`) and an async round-trip through their `Transport`,
//! followed by `http::classify`. Headers are layered with later layers
//! winning on name collision:
//!
//! 1. `Content-Type: application/json`
//! 2. `ClientConfig::default_headers`
//! 3. context headers (server only: cache bypass, forwarded cookie,
//!    forwarded `Authorization`, bearer token from `access_token`)
//! 4. caller-supplied headers
//!
//! `BrowserClient` attaches no credentials of its own. `ServerClient` is
//! constructed with an `InboundContext` holding the cookie and
//! authorization values of the request it is serving, and forwards them
//! when the per-call options ask for it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cancel::CancelSignal;
use crate::config::{normalize_base_url, ClientConfig};
use crate::error::ApiError;
use crate::headers::{
    auth_headers, APPLICATION_JSON, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, COOKIE,
};
use crate::http::{classify, header_value, merge_headers, set_header, HttpMethod, HttpRequest};
use crate::transport::{ReqwestTransport, Transport};

/// Per-call options shared by both clients.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body. `None` sends no body at all.
    pub body: Option<String>,
    /// Overrides `ClientConfig::base_url` for this call.
    pub base_url: Option<String>,
    pub signal: Option<CancelSignal>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn signal(mut self, signal: CancelSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Response caching behavior requested from intermediaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Send `Cache-Control: no-store`.
    #[default]
    NoStore,
    /// Leave caching headers to the caller.
    Default,
}

/// Per-call options for `ServerClient`.
#[derive(Debug, Clone)]
pub struct ServerRequestOptions {
    pub request: RequestOptions,
    /// Sent as `Authorization: Bearer <token>`; wins over a forwarded
    /// `Authorization` header.
    pub access_token: Option<String>,
    /// Copy the inbound `Cookie` header. Off by default.
    pub forward_cookies: bool,
    /// Copy the inbound `Authorization` header. On by default.
    pub forward_auth: bool,
    pub cache: CacheMode,
}

impl Default for ServerRequestOptions {
    fn default() -> Self {
        Self {
            request: RequestOptions::default(),
            access_token: None,
            forward_cookies: false,
            forward_auth: true,
            cache: CacheMode::NoStore,
        }
    }
}

impl ServerRequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    pub fn access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    pub fn forward_cookies(mut self, enabled: bool) -> Self {
        self.forward_cookies = enabled;
        self
    }

    pub fn forward_auth(mut self, enabled: bool) -> Self {
        self.forward_auth = enabled;
        self
    }

    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }
}

impl From<RequestOptions> for ServerRequestOptions {
    fn from(request: RequestOptions) -> Self {
        Self::default().request(request)
    }
}

/// Credentials carried by the inbound request a server-side call is made
/// on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundContext {
    pub cookie: Option<String>,
    pub authorization: Option<String>,
}

impl InboundContext {
    pub fn new(cookie: Option<&str>, authorization: Option<&str>) -> Self {
        Self {
            cookie: non_empty(cookie),
            authorization: non_empty(authorization),
        }
    }

    pub fn from_headers(headers: &[(String, String)]) -> Self {
        Self::new(header_value(headers, COOKIE), header_value(headers, AUTHORIZATION))
    }

    pub fn from_header_map(headers: &reqwest::header::HeaderMap) -> Self {
        let get = |name: reqwest::header::HeaderName| {
            headers.get(name).and_then(|v| v.to_str().ok())
        };
        Self::new(
            get(reqwest::header::COOKIE),
            get(reqwest::header::AUTHORIZATION),
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Client for calls made with explicit inputs only, typically from code
/// that already holds a live session token.
#[derive(Debug, Clone)]
pub struct BrowserClient<X = ReqwestTransport> {
    config: ClientConfig,
    transport: X,
}

impl BrowserClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }
}

impl<X: Transport> BrowserClient<X> {
    pub fn with_transport(config: ClientConfig, transport: X) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_request(&self, path: &str, options: &RequestOptions) -> HttpRequest {
        build_request(&self.config, path, options, &[])
    }

    /// Perform one call and decode the success payload as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.build_request(path, &options);
        execute(&self.transport, request, options.signal.as_ref()).await
    }
}

/// Client for calls made while serving an inbound request.
#[derive(Debug, Clone)]
pub struct ServerClient<X = ReqwestTransport> {
    config: ClientConfig,
    inbound: InboundContext,
    transport: X,
}

impl ServerClient<ReqwestTransport> {
    pub fn new(config: ClientConfig, inbound: InboundContext) -> Result<Self, ApiError> {
        Ok(Self::with_transport(config, inbound, ReqwestTransport::new()?))
    }
}

impl<X: Transport> ServerClient<X> {
    pub fn with_transport(config: ClientConfig, inbound: InboundContext, transport: X) -> Self {
        Self {
            config,
            inbound,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn inbound(&self) -> &InboundContext {
        &self.inbound
    }

    /// Context headers for one call, in layering order.
    pub fn context_headers(&self, options: &ServerRequestOptions) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if options.cache == CacheMode::NoStore {
            headers.push((CACHE_CONTROL.to_string(), "no-store".to_string()));
        }
        if options.forward_cookies {
            if let Some(cookie) = &self.inbound.cookie {
                headers.push((COOKIE.to_string(), cookie.clone()));
            }
        }
        if options.forward_auth {
            if let Some(authorization) = &self.inbound.authorization {
                set_header(&mut headers, AUTHORIZATION, authorization);
            }
        }
        merge_headers(&mut headers, &auth_headers(options.access_token.as_deref()));
        headers
    }

    pub fn build_request(&self, path: &str, options: &ServerRequestOptions) -> HttpRequest {
        let context = self.context_headers(options);
        build_request(&self.config, path, &options.request, &context)
    }

    /// Perform one call and decode the success payload as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: ServerRequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.build_request(path, &options);
        execute(&self.transport, request, options.request.signal.as_ref()).await
    }
}

fn build_request(
    config: &ClientConfig,
    path: &str,
    options: &RequestOptions,
    context: &[(String, String)],
) -> HttpRequest {
    let base_url = match &options.base_url {
        Some(base_url) => normalize_base_url(base_url),
        None => config.base_url.clone(),
    };

    let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
    merge_headers(&mut headers, &config.default_headers);
    merge_headers(&mut headers, context);
    merge_headers(&mut headers, &options.headers);

    HttpRequest {
        method: options.method,
        url: format!("{base_url}{path}"),
        headers,
        body: options.body.clone(),
    }
}

async fn execute<T, X>(
    transport: &X,
    request: HttpRequest,
    signal: Option<&CancelSignal>,
) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    X: Transport,
{
    debug!(method = request.method.as_str(), url = %request.url, "sending backend request");
    let round_trip = async { transport.execute(request).await.map_err(ApiError::from) };
    let response = match signal {
        Some(signal) => signal.run(round_trip).await?,
        None => round_trip.await?,
    };
    debug!(status = response.status, "backend responded");
    classify(response).into_result()
}
