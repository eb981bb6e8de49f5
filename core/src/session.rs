//! Session gate for protected pages.
//!
//! # Design
//! Authentication itself belongs to the identity provider. This module only
//! fixes the contract the rest of the crate relies on (`SessionProvider`)
//! and the routing decision made on top of it: protected paths require a
//! session, and a visitor without one is redirected to the login page with
//! the original path preserved. A signed-in visitor on a sign-in page is
//! sent to the dashboard instead.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Sections that require a signed-in user.
pub const PROTECTED_PREFIXES: &[&str] = &["/orders", "/dashboard", "/settings"];

/// Sign-in flow pages, pointless once signed in.
pub const AUTH_PATHS: &[&str] = &["/login", "/reset-password", "/callback"];

/// Tokens issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp, seconds.
    pub expires_at: Option<i64>,
}

/// The identity provider's view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResult {
    Authenticated { session: Session, user: SessionUser },
    Anonymous,
}

/// Yields the current session, validating or refreshing it as needed.
/// Implementations must return `Anonymous` when the user cannot be
/// validated, even if a session cookie is present.
pub trait SessionProvider: Send + Sync {
    fn session(&self) -> impl Future<Output = SessionResult> + Send;
}

/// Redirect issued when a page needs a session the visitor lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
}

pub async fn access_token<P: SessionProvider>(provider: &P) -> Option<String> {
    match provider.session().await {
        SessionResult::Authenticated { session, .. } => Some(session.access_token),
        SessionResult::Anonymous => None,
    }
}

/// The current session, or a redirect to the login page.
pub async fn require_session<P: SessionProvider>(
    provider: &P,
) -> Result<(Session, SessionUser), Redirect> {
    match provider.session().await {
        SessionResult::Authenticated { session, user } => Ok((session, user)),
        SessionResult::Anonymous => Err(Redirect {
            location: LOGIN_PATH.to_string(),
        }),
    }
}

/// Outcome of gating one inbound page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Continue,
    RedirectToLogin { location: String },
    /// Signed in already; go to `DASHBOARD_PATH`.
    RedirectToDashboard,
}

/// `path` is `section` itself or lies below it; `/orders-archive` is not
/// under `/orders`.
fn in_section(path: &str, section: &str) -> bool {
    path.strip_prefix(section)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|section| in_section(path, section))
}

pub fn is_auth_path(path: &str) -> bool {
    AUTH_PATHS.iter().any(|section| in_section(path, section))
}

/// Gate `path`. Paths that are neither protected nor part of the sign-in
/// flow never consult the provider.
pub async fn guard<P: SessionProvider>(path: &str, provider: &P) -> GuardDecision {
    let protected = is_protected(path);
    let auth = is_auth_path(path);
    if !protected && !auth {
        return GuardDecision::Continue;
    }
    match provider.session().await {
        SessionResult::Authenticated { .. } if auth => {
            debug!(path, "signed-in visitor on sign-in page");
            GuardDecision::RedirectToDashboard
        }
        SessionResult::Anonymous if protected => {
            debug!(path, "no session for protected path");
            GuardDecision::RedirectToLogin {
                location: login_redirect(path),
            }
        }
        _ => GuardDecision::Continue,
    }
}

/// `/login?redirect=<path>`.
pub fn login_redirect(path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", path)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}
