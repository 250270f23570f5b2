//! Create action - publishes a release and uploads its assets.

use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;

use crate::asset::LocalAsset;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::github::{Asset, NewRelease, Release, ReleaseApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    pub tag: String,
    pub target: Option<String>,
    pub title: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    pub dry_run: bool,
}

impl CreateOptions {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            target: None,
            title: String::new(),
            body: String::new(),
            draft: true,
            prerelease: true,
            dry_run: true,
        }
    }

    fn new_release(&self) -> NewRelease {
        NewRelease {
            tag_name: self.tag.clone(),
            target_commitish: self.target.clone().unwrap_or_default(),
            name: self.title.clone(),
            body: self.body.clone(),
            draft: self.draft,
            prerelease: self.prerelease,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CreateOutcome {
    /// No asset file matched; nothing was sent.
    NothingToRelease,
    Created { release: Release, assets: Vec<Asset> },
    /// Dry run: what would have been created and uploaded.
    Simulated { release: Release, assets: Vec<Asset> },
}

pub struct CreateAction<'a, A: ReleaseApi + ?Sized> {
    api: &'a A,
    ctx: &'a ExecutionContext,
}

impl<'a, A: ReleaseApi + ?Sized> CreateAction<'a, A> {
    pub fn new(api: &'a A, ctx: &'a ExecutionContext) -> Self {
        Self { api, ctx }
    }

    /// Creates the release, then uploads `assets` in order.
    ///
    /// If an upload fails the freshly created release is deleted again and
    /// the upload error is returned.
    #[tracing::instrument(skip(self, options))]
    pub async fn run(&self, options: &CreateOptions, assets: &[PathBuf]) -> Result<CreateOutcome> {
        if assets.is_empty() {
            info!("asset files not found");
            return Ok(CreateOutcome::NothingToRelease);
        }

        let request = options.new_release();
        info!(
            "create release: tag={:?} target={:?} title={:?} draft={} prerelease={}",
            request.tag_name, request.target_commitish, request.name, request.draft, request.prerelease
        );

        self.ctx.check()?;
        let release = if options.dry_run {
            Release {
                tag_name: request.tag_name.clone(),
                target_commitish: request.target_commitish.clone(),
                name: Some(request.name.clone()),
                body: Some(request.body.clone()),
                draft: request.draft,
                prerelease: request.prerelease,
                ..Default::default()
            }
        } else {
            self.api.create_release(&request).await?
        };
        self.ctx.dump("create release", &release);

        let mut uploaded = Vec::with_capacity(assets.len());
        for path in assets {
            match self.upload(&release, path, options.dry_run).await {
                Ok(asset) => uploaded.push(asset),
                Err(e) => {
                    if !options.dry_run {
                        self.rollback(&release).await;
                    }
                    return Err(e);
                }
            }
        }

        if options.dry_run {
            Ok(CreateOutcome::Simulated {
                release,
                assets: uploaded,
            })
        } else {
            Ok(CreateOutcome::Created {
                release,
                assets: uploaded,
            })
        }
    }

    async fn upload(&self, release: &Release, path: &Path, dry_run: bool) -> Result<Asset> {
        self.ctx.check()?;
        let local = LocalAsset::open(path).await?;
        info!("upload {} {} byte ({})", local.name, local.size, local.mime);

        if dry_run {
            return Ok(Asset {
                name: local.name,
                size: local.size,
                content_type: local.mime.to_string(),
                ..Default::default()
            });
        }

        let asset = self
            .api
            .upload_asset(release, &local.name, local.file, local.size, local.mime)
            .await?;
        self.ctx.dump("upload asset", &asset);
        Ok(asset)
    }

    async fn rollback(&self, release: &Release) {
        info!("deleting release {} after failed upload", release.id);
        if let Err(e) = self.api.delete_release(release.id).await {
            error!("failed to delete the failed release {}: {}", release.id, e);
        }
    }
}
