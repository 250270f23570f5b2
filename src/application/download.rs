//! Download action - fetches one asset of a resolved release.

use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::context::ExecutionContext;
use crate::error::{AdminError, Result};
use crate::github::{Asset, Release, ReleaseApi, TagTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadRequest {
    Latest,
    ById(u64),
    ByTag(TagTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Exact name of the asset in the release.
    pub asset_name: String,
    /// Destination path; defaults to the asset name.
    pub save_as: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadOutcome {
    pub release_id: u64,
    pub tag_name: String,
    pub asset: Asset,
    pub path: PathBuf,
    /// Bytes written; absent in a dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

pub struct DownloadAction<'a, A: ReleaseApi + ?Sized> {
    api: &'a A,
    ctx: &'a ExecutionContext,
}

impl<'a, A: ReleaseApi + ?Sized> DownloadAction<'a, A> {
    pub fn new(api: &'a A, ctx: &'a ExecutionContext) -> Self {
        Self { api, ctx }
    }

    async fn resolve(&self, request: &DownloadRequest) -> Result<Release> {
        let release = match request {
            DownloadRequest::Latest => self.api.get_latest_release().await?,
            DownloadRequest::ById(id) => self.api.get_release(*id).await?,
            DownloadRequest::ByTag(tag) => self
                .api
                .get_release_by_tag(&tag.tag)
                .await?
                .filter(|r| tag.target.as_ref().is_none_or(|t| *t == r.target_commitish)),
        };

        release.ok_or_else(|| {
            AdminError::NotFound(match request {
                DownloadRequest::Latest => "latest release".to_string(),
                DownloadRequest::ById(id) => format!("release {}", id),
                DownloadRequest::ByTag(tag) => format!("release {}", tag),
            })
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(
        &self,
        request: &DownloadRequest,
        options: &DownloadOptions,
    ) -> Result<DownloadOutcome> {
        self.ctx.check()?;
        let release = self.resolve(request).await?;
        let asset = release.asset(&options.asset_name).cloned().ok_or_else(|| {
            AdminError::NotFound(format!(
                "asset {:?} in release {}",
                options.asset_name, release.tag_name
            ))
        })?;
        self.ctx.dump(&format!("download asset {}", asset.id), &asset);

        let path = options
            .save_as
            .clone()
            .unwrap_or_else(|| PathBuf::from(&asset.name));
        info!(
            "download asset {} ({} bytes) to {:?}{}",
            asset.name,
            asset.size,
            path,
            if options.dry_run { " [dry-run]" } else { "" }
        );

        let bytes = if options.dry_run {
            None
        } else {
            let written = self.api.download_asset(&asset, &path).await?;
            Some(written.ok_or_else(|| {
                AdminError::NotFound(format!("asset {} ({})", asset.id, asset.name))
            })?)
        };

        Ok(DownloadOutcome {
            release_id: release.id,
            tag_name: release.tag_name,
            asset,
            path,
            bytes,
        })
    }
}
