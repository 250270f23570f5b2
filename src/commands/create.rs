use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use log::debug;

use crate::{
    application::{CreateAction, CreateOptions},
    asset,
    context::ExecutionContext,
    github::ReleaseApi,
    runtime::Runtime,
    selection::{MatchMode, TagMatcher},
};

use super::write_json;

/// Which local files become release assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSelection {
    pub dir: PathBuf,
    /// File name, or a pattern when `mode` is not plain.
    pub filename: String,
    pub mode: MatchMode,
}

/// Create a release from the files selected in `assets` and print the outcome
#[tracing::instrument(skip(runtime, api, ctx, out))]
pub async fn create<R, A, W>(
    runtime: &R,
    api: &A,
    ctx: &ExecutionContext,
    options: &CreateOptions,
    assets: &AssetSelection,
    out: &mut W,
) -> Result<()>
where
    R: Runtime + ?Sized,
    A: ReleaseApi + ?Sized,
    W: Write,
{
    let matcher = TagMatcher::compile(&assets.filename, assets.mode)?;
    let files = asset::scan(runtime, &assets.dir, &matcher)?;
    debug!("Selected asset files: {:?}", files);

    let outcome = CreateAction::new(api, ctx).run(options, &files).await?;
    write_json(out, &outcome)
}
