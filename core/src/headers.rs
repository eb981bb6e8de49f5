//! Well-known header names and the bearer-token header builder.

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const COOKIE: &str = "Cookie";
pub const CACHE_CONTROL: &str = "Cache-Control";

pub const APPLICATION_JSON: &str = "application/json";

/// Headers carrying `access_token` as a bearer credential.
///
/// An absent or empty token yields no headers at all, never a placeholder
/// `Authorization` value.
pub fn auth_headers(access_token: Option<&str>) -> Vec<(String, String)> {
    match access_token {
        Some(token) if !token.is_empty() => {
            vec![(AUTHORIZATION.to_string(), format!("Bearer {token}"))]
        }
        _ => Vec::new(),
    }
}
