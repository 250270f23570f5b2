use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use reqwest::StatusCode;
use url::Url;

use super::repo::RepoId;
use super::types::{Asset, Branch, Comparison, NewRelease, Page, Release};
use crate::error::{AdminError, Result};
use crate::http::HttpClient;

static UPLOAD_URL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("/assets[^/]*$").expect("valid upload suffix pattern"));

/// Release operations of one repository.
///
/// Lookups of a single resource return `Ok(None)` when the server answers
/// 404; every other unexpected status is an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    async fn list_releases(&self, per_page: u32, page: u32) -> Result<Page<Release>>;
    async fn get_release(&self, id: u64) -> Result<Option<Release>>;
    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>>;
    async fn get_latest_release(&self) -> Result<Option<Release>>;
    async fn create_release(&self, release: &NewRelease) -> Result<Release>;
    async fn delete_release(&self, id: u64) -> Result<()>;
    /// Removes `refs/tags/{tag}`; a tag that is already gone is not an error.
    async fn delete_tag(&self, tag: &str) -> Result<()>;
    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        file: tokio::fs::File,
        size: u64,
        mime: &str,
    ) -> Result<Asset>;
    /// Saves the asset contents to `dest`; `None` when the asset is gone.
    async fn download_asset(&self, asset: &Asset, dest: &Path) -> Result<Option<u64>>;
    async fn get_branch(&self, name: &str) -> Result<Option<Branch>>;
    async fn list_branches(&self, per_page: u32, page: u32) -> Result<Page<Branch>>;
    /// Compares `base...head`; `None` when either side is unknown.
    async fn compare(&self, base: &str, head: &str) -> Result<Option<Comparison>>;
}

pub struct GitHub {
    client: HttpClient,
    repo: RepoId,
}

impl GitHub {
    #[tracing::instrument(skip(client))]
    pub fn new(client: HttpClient, repo: RepoId) -> Self {
        Self { client, repo }
    }

    /// Upload endpoint for `name`, derived from the release's URL template.
    pub fn upload_url(release: &Release, name: &str) -> Result<String> {
        let template = release.upload_url.as_deref().unwrap_or_default();
        if template.is_empty() {
            return Err(AdminError::InvalidArgument(format!(
                "release {} has no upload_url",
                release.id
            )));
        }

        let base = UPLOAD_URL_SUFFIX.replace(template, "");
        let mut url = Url::parse(&format!("{}/assets", base)).map_err(|e| {
            AdminError::InvalidArgument(format!("invalid upload_url {:?}: {}", template, e))
        })?;
        url.query_pairs_mut().append_pair("name", name);
        Ok(url.into())
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Page<T>> {
        let endpoint = format!("/{}?per_page={}&page={}", resource, per_page, page);
        self.client
            .get_page(&endpoint)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("repository {}", self.repo)))
    }
}

#[async_trait]
impl ReleaseApi for GitHub {
    #[tracing::instrument(skip(self))]
    async fn list_releases(&self, per_page: u32, page: u32) -> Result<Page<Release>> {
        self.list("releases", per_page, page).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_release(&self, id: u64) -> Result<Option<Release>> {
        self.client
            .get_json_optional(&format!("/releases/{}", id))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        self.client
            .get_json_optional(&format!("/releases/tags/{}", tag))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_latest_release(&self) -> Result<Option<Release>> {
        self.client.get_json_optional("/releases/latest").await
    }

    #[tracing::instrument(skip(self, release))]
    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        debug!("Creating release {:?}...", release.tag_name);
        self.client
            .post_json("/releases", release, StatusCode::CREATED)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_release(&self, id: u64) -> Result<()> {
        self.client
            .delete(&format!("/releases/{}", id), &[StatusCode::NO_CONTENT])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_tag(&self, tag: &str) -> Result<()> {
        let status = self
            .client
            .delete(
                &format!("/git/refs/tags/{}", tag),
                &[StatusCode::NO_CONTENT, StatusCode::UNPROCESSABLE_ENTITY],
            )
            .await?;
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            debug!("tag {:?} does not exist", tag);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, release, file))]
    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        file: tokio::fs::File,
        size: u64,
        mime: &str,
    ) -> Result<Asset> {
        let url = Self::upload_url(release, name)?;
        self.client.upload(&url, file, size, mime).await
    }

    #[tracing::instrument(skip(self, asset))]
    async fn download_asset(&self, asset: &Asset, dest: &Path) -> Result<Option<u64>> {
        let declared = (asset.size > 0).then_some(asset.size);
        self.client
            .download(&format!("/releases/assets/{}", asset.id), dest, declared)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_branch(&self, name: &str) -> Result<Option<Branch>> {
        self.client
            .get_json_optional(&format!("/branches/{}", name))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_branches(&self, per_page: u32, page: u32) -> Result<Page<Branch>> {
        self.list("branches", per_page, page).await
    }

    #[tracing::instrument(skip(self))]
    async fn compare(&self, base: &str, head: &str) -> Result<Option<Comparison>> {
        self.client
            .get_json_optional(&format!("/compare/{}...{}", base, head))
            .await
    }
}
