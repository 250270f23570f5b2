use std::io::Write;

use anyhow::Result;

use crate::{
    application::{DownloadAction, DownloadOptions, DownloadRequest},
    context::ExecutionContext,
    github::ReleaseApi,
};

use super::write_json;

/// Download one asset and print where it went
#[tracing::instrument(skip(api, ctx, out))]
pub async fn download<A, W>(
    api: &A,
    ctx: &ExecutionContext,
    request: &DownloadRequest,
    options: &DownloadOptions,
    out: &mut W,
) -> Result<()>
where
    A: ReleaseApi + ?Sized,
    W: Write,
{
    let outcome = DownloadAction::new(api, ctx).run(request, options).await?;
    write_json(out, &outcome)
}
