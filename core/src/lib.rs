//! Backend API core for the RoadTrack order-management front end.
//!
//! # Overview
//! Shapes requests to the RoadTrack backend and the responses that come
//! back: header layering with bearer and forwarded credentials, outcome
//! classification into a typed failure taxonomy, cancellation with
//! deadlines, bounded retry, and DTO to domain mapping.
//!
//! # Design
//! - `BrowserClient` and `ServerClient` are stateless apart from their
//!   `ClientConfig`; the server variant also holds the inbound request's
//!   credentials, passed in explicitly.
//! - Every call is split into a pure `build_request` and a round-trip
//!   through a `Transport`, so the I/O boundary stays explicit and
//!   swappable in tests.
//! - Failures are values: `ApiError` distinguishes `Http`, `Network` and
//!   `Cancelled`, and `HttpFailure` derives its classification from the
//!   raw status code.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod mapping;
pub mod orders;
pub mod retry;
pub mod roles;
pub mod session;
pub mod transport;
pub mod types;
pub mod users;

pub use cancel::{CancelSignal, CancelToken};
pub use client::{
    BrowserClient, CacheMode, InboundContext, RequestOptions, ServerClient, ServerRequestOptions,
};
pub use config::ClientConfig;
pub use error::{ApiError, FailureKind, HttpFailure, NetworkFailure};
pub use headers::auth_headers;
pub use http::{classify, HttpMethod, HttpRequest, HttpResponse, Outcome};
pub use retry::{with_retry, with_retry_until_cancelled, RetryPolicy};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AuthProfile, Order, OrderDto, OrderStatus, OrdersListDto, OrdersPage, OrdersSummary, User,
    UserDto, UserProfile, UserProfileDto,
};
