//! Repository-scoped HTTP client with cancellation and status handling.

use std::path::Path;

use log::debug;
use reqwest::{
    Body, Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, EXPECT, HeaderValue, LINK},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::io::ReaderStream;

use super::endpoint::normalize_endpoint;
use super::pagination::next_page;
use super::response::unexpected;
use crate::context::ExecutionContext;
use crate::download::PartialFile;
use crate::error::{AdminError, Result, TransportError};
use crate::github::Page;

/// Media type GitHub uses for raw asset contents.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// HTTP client bound to one repository's API root.
///
/// Every request is raced against the context's cancellation token.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    ctx: ExecutionContext,
}

impl HttpClient {
    /// Creates a client sending requests to `base_url` + endpoint, where
    /// `base_url` is `{api_url}/repos/{owner}/{repo}`.
    pub fn new(client: Client, base_url: impl Into<String>, ctx: ExecutionContext) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ctx,
        }
    }

    /// Absolute URL for a repository-relative endpoint.
    pub fn url(&self, endpoint: &str) -> Result<String> {
        Ok(format!("{}{}", self.base_url, normalize_endpoint(endpoint)?))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.ctx
            .run(async { request.send().await.map_err(AdminError::from) })
            .await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let bytes = self
            .ctx
            .run(async { response.bytes().await.map_err(AdminError::from) })
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET expecting 200 and a JSON body.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        match self.get_json_optional(endpoint).await? {
            Some(value) => Ok(value),
            None => Err(AdminError::NotFound(endpoint.to_string())),
        }
    }

    /// GET expecting 200 and a JSON body; 404 yields `None`.
    #[tracing::instrument(skip(self))]
    pub async fn get_json_optional<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        let url = self.url(endpoint)?;
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::OK => Ok(Some(self.decode(response).await?)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected(response, true).await.into()),
        }
    }

    /// GET of one page of a listing; 404 yields `None`.
    #[tracing::instrument(skip(self))]
    pub async fn get_page<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<Page<T>>> {
        let url = self.url(endpoint)?;
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::OK => {
                let next_page = next_page(
                    response
                        .headers()
                        .get_all(LINK)
                        .iter()
                        .filter_map(|v| v.to_str().ok()),
                );
                let items: Vec<T> = self.decode(response).await?;
                Ok(Some(Page { items, next_page }))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected(response, true).await.into()),
        }
    }

    /// POST a JSON body, expecting `expected` and a JSON answer.
    #[tracing::instrument(skip(self, body))]
    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B, expected: StatusCode) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint)?;
        debug!("POST {}", url);

        let response = self.send(self.client.post(&url).json(body)).await?;
        if response.status() != expected {
            return Err(unexpected(response, true).await.into());
        }
        self.decode(response).await
    }

    /// DELETE accepting any of the `accepted` statuses.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, endpoint: &str, accepted: &[StatusCode]) -> Result<StatusCode> {
        let url = self.url(endpoint)?;
        debug!("DELETE {}", url);

        let response = self.send(self.client.delete(&url)).await?;
        let status = response.status();
        if accepted.contains(&status) {
            Ok(status)
        } else {
            Err(unexpected(response, true).await.into())
        }
    }

    /// Streams `file` to an absolute upload URL, expecting 201.
    #[tracing::instrument(skip(self, file))]
    pub async fn upload<T: DeserializeOwned>(
        &self,
        url: &str,
        file: tokio::fs::File,
        size: u64,
        mime: &str,
    ) -> Result<T> {
        debug!("POST {} ({} bytes, {})", url, size, mime);

        let content_type = HeaderValue::from_str(mime)
            .map_err(|e| AdminError::InvalidArgument(format!("invalid MIME type {:?}: {}", mime, e)))?;
        let body = Body::wrap_stream(ReaderStream::new(file));
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, size)
            .header(EXPECT, "100-continue")
            .body(body);

        let response = self.send(request).await?;
        if response.status() != StatusCode::CREATED {
            return Err(unexpected(response, true).await.into());
        }
        self.decode(response).await
    }

    /// Downloads raw contents into `dest`.
    ///
    /// The received byte count must equal `Content-Length`, or
    /// `declared_size` when the header is absent. Returns `None` on 404.
    #[tracing::instrument(skip(self))]
    pub async fn download(
        &self,
        endpoint: &str,
        dest: &Path,
        declared_size: Option<u64>,
    ) -> Result<Option<u64>> {
        let url = self.url(endpoint)?;
        debug!("GET {} -> {:?}", url, dest);

        let request = self.client.get(&url).header(ACCEPT, OCTET_STREAM);
        let mut response = self.send(request).await?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            _ => return Err(unexpected(response, false).await.into()),
        }

        let expected = response.content_length().or(declared_size);
        let mut partial = PartialFile::create(dest)?;
        loop {
            let chunk = self
                .ctx
                .run(async {
                    response
                        .chunk()
                        .await
                        .map_err(|e| AdminError::Transport(TransportError::Request(e)))
                })
                .await?;
            match chunk {
                Some(chunk) => partial.write_chunk(&chunk)?,
                None => break,
            }
        }

        partial.finish(expected).map(Some)
    }
}
