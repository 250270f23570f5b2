//! Service factory for building the API client from configuration.

use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{context::ExecutionContext, github::GitHub, http::HttpClient};

use super::config::Config;

pub const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// Build an HTTP client scoped to the configured repository
pub fn build_http_client(config: &Config, ctx: &ExecutionContext) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

    if let Some(token) = config.token.as_deref() {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("HTTP client configured with authentication");
    }

    let client = Client::builder()
        .user_agent(concat!("ghra-cli/", env!("GHRA_VERSION")))
        .default_headers(headers)
        .build()?;

    Ok(HttpClient::new(client, config.base_url(), ctx.clone()))
}

/// Build the GitHub release API for the configured repository
pub fn build_github(config: &Config, ctx: &ExecutionContext) -> Result<GitHub> {
    let http_client = build_http_client(config, ctx)?;
    Ok(GitHub::new(http_client, config.repo.clone()))
}
