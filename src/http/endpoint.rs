//! Endpoint path normalization and API base URL validation.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{AdminError, Result};

/// Default API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("valid scheme pattern"));
static MULTIPLE_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("/+").expect("valid slash pattern"));
static RESOLVE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("valid resolve base"));

/// Normalizes a repository-relative endpoint such as `/releases/1?x=y`.
///
/// Dot segments are resolved against a placeholder root, the result always
/// starts with `/`, runs of slashes collapse into one, and the query string
/// is kept verbatim. Characters not allowed in a URL path are percent-encoded.
/// Anything carrying a scheme, an authority or a fragment is rejected.
pub fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let invalid = || AdminError::InvalidEndpoint(endpoint.to_string());

    if endpoint.contains('#') || endpoint.starts_with("//") || SCHEME.is_match(endpoint) {
        return Err(invalid());
    }
    if endpoint.chars().any(|c| c.is_ascii_control()) {
        return Err(invalid());
    }

    let (path, query) = match endpoint.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (endpoint, None),
    };

    let first_segment = path.split('/').next().unwrap_or_default();
    if first_segment.contains(':') {
        return Err(invalid());
    }

    let resolved = RESOLVE_BASE.join(path).map_err(|_| invalid())?;
    if resolved.host_str() != RESOLVE_BASE.host_str() {
        return Err(invalid());
    }
    let mut normalized = MULTIPLE_SLASHES.replace_all(resolved.path(), "/").into_owned();
    if let Some(query) = query {
        normalized.push('?');
        normalized.push_str(query);
    }

    Ok(normalized)
}

/// Checks an API root such as `https://api.github.com` and returns it
/// without a trailing slash.
///
/// Only a scheme, a host and an optional port are allowed; a path other
/// than `/`, a query or a fragment make the value invalid. `source` names
/// where the value came from in error messages.
pub fn validate_api_url(value: &str, source: &str) -> Result<String> {
    let invalid = |reason: &str| {
        AdminError::InvalidConfiguration(format!("invalid {} {:?}: {}", source, value, reason))
    };

    let url = Url::parse(value.trim()).map_err(|e| invalid(&e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    if !matches!(url.path(), "" | "/") {
        return Err(invalid("path is not allowed"));
    }
    if url.query().is_some() {
        return Err(invalid("query is not allowed"));
    }
    if url.fragment().is_some() {
        return Err(invalid("fragment is not allowed"));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
