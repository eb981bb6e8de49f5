//! Client configuration.
//!
//! Loaded once at startup and handed to client constructors. Request
//! handling never reads the environment.

use std::env;

use crate::http::set_header;

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_VAR: &str = "ROADTRACK_BACKEND_URL";

/// Settings shared by every request a client makes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix for every request path, without a trailing slash.
    pub base_url: String,
    /// Applied after `Content-Type` and before auth and caller headers.
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            default_headers: Vec::new(),
        }
    }

    /// Read `ROADTRACK_BACKEND_URL`. An unset variable yields an empty base
    /// URL, so paths are used as-is.
    pub fn from_env() -> Self {
        let base_url = env::var(BACKEND_URL_VAR).unwrap_or_default();
        Self::new(&base_url)
    }

    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.default_headers, name, value);
        self
    }
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
