use std::io::Write;

use anyhow::Result;
use log::debug;

use crate::{
    application::{ListAction, ListOptions},
    context::ExecutionContext,
    github::ReleaseApi,
};

use super::write_json;

/// Print the releases matching `options` as a JSON array
#[tracing::instrument(skip(api, ctx, out))]
pub async fn list<A, W>(
    api: &A,
    ctx: &ExecutionContext,
    options: &ListOptions,
    out: &mut W,
) -> Result<()>
where
    A: ReleaseApi + ?Sized,
    W: Write,
{
    let releases = ListAction::new(api, ctx).run(options).await?;
    debug!("Found {} release(s)", releases.len());
    write_json(out, &releases)
}
