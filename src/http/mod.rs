//! API transport: endpoint handling, pagination headers and status checks.

mod client;
mod endpoint;
mod pagination;
mod response;

pub use client::{HttpClient, OCTET_STREAM};
pub use endpoint::{DEFAULT_API_URL, normalize_endpoint, validate_api_url};
pub use pagination::{next_page, parse_next_page};
pub use response::{dump, hint};
