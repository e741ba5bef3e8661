//! The path-rewriting rule.
//!
//! Pure and stateless: `/api/<rest>?<query>` becomes
//! `<backend base>/api/v1/<rest>?<query>`; anything else is not
//! backend-bound. Method, body, headers, and query string are the proxy
//! handler's job to preserve; this module only decides the target.

use std::env;

/// Public path prefix the dashboard issues all backend calls under.
pub const PUBLIC_API_PREFIX: &str = "/api";

/// Versioned prefix the backend actually serves.
pub const BACKEND_API_VERSION: &str = "/api/v1";

/// Environment variable carrying the backend's internal origin.
pub const BACKEND_URL_ENV: &str = "BACKEND_INTERNAL_URL";

const DEFAULT_BACKEND_URL: &str = "http://localhost:4000";

/// Backend origin, resolved at request time so one artifact can be deployed
/// against different backends.
pub fn backend_base() -> String {
    env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
}

/// Rewrite a public path to its backend target.
///
/// Returns `None` for paths outside the public prefix; those pass through
/// unmodified and never reach the backend.
pub fn rewrite_target(backend_base: &str, path: &str, query: Option<&str>) -> Option<String> {
    let rest = path.strip_prefix(PUBLIC_API_PREFIX)?;
    // "/apiary" is not an API path.
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }

    let mut target = format!(
        "{}{}{}",
        backend_base.trim_end_matches('/'),
        BACKEND_API_VERSION,
        rest
    );
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    Some(target)
}
