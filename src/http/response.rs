//! Turning unexpected responses into transport errors.

use log::warn;
use reqwest::{Response, StatusCode};

use crate::error::TransportError;

/// A short explanation for statuses that usually point at the caller's
/// setup rather than at the request itself.
pub fn hint(status: StatusCode, body: &str) -> Option<&'static str> {
    match status {
        StatusCode::UNAUTHORIZED => Some("authentication failed, check GITHUB_TOKEN"),
        StatusCode::FORBIDDEN if body.contains("rate limit") => {
            Some("API rate limit exceeded, try again later or set GITHUB_TOKEN")
        }
        StatusCode::FORBIDDEN => Some("access forbidden, the token may lack permissions"),
        StatusCode::TOO_MANY_REQUESTS => Some("too many requests, try again later"),
        _ => None,
    }
}

/// Renders the status line and headers, plus the body when `with_body`.
pub async fn dump(response: Response, with_body: bool) -> String {
    let mut out = format!("{:?} {}\r\n", response.version(), response.status());
    for (name, value) in response.headers() {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");

    if with_body {
        match response.text().await {
            Ok(body) => out.push_str(&body),
            Err(e) => out.push_str(&format!("<failed to read body: {}>", e)),
        }
    }
    out
}

/// Consumes a response whose status was not expected.
pub async fn unexpected(response: Response, with_body: bool) -> TransportError {
    let status = response.status();
    let dump = dump(response, with_body).await;
    if let Some(hint) = hint(status, &dump) {
        warn!("{}", hint);
    }
    TransportError::Status { status, dump }
}
