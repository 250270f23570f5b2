use std::io::Write;

use anyhow::Result;
use log::{info, warn};

use crate::{
    application::{DeleteAction, DeleteOptions, DeleteRequest},
    context::ExecutionContext,
    error::AdminError,
    github::ReleaseApi,
};

use super::write_json;

/// Delete the releases selected by `request` and print them as a JSON array.
///
/// When the run stops half-way, the releases already deleted are printed
/// before the error is returned.
#[tracing::instrument(skip(api, ctx, out))]
pub async fn delete<A, W>(
    api: &A,
    ctx: &ExecutionContext,
    request: &DeleteRequest,
    options: &DeleteOptions,
    out: &mut W,
) -> Result<()>
where
    A: ReleaseApi + ?Sized,
    W: Write,
{
    let result = DeleteAction::new(api, ctx).run(request, options).await;

    if let Err(AdminError::PartialFailure { completed, .. }) = &result {
        warn!("{} release(s) were deleted before the failure", completed.len());
        write_json(out, completed)?;
    }
    let deleted = result?;

    if options.dry_run {
        info!(
            "dry run: {} release(s) would be deleted, pass --no-dry-run to delete them",
            deleted.len()
        );
    }
    write_json(out, &deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::BulkSelector;
    use crate::error::TransportError;
    use crate::github::{MockReleaseApi, Page, Release};

    fn drafts() -> Vec<Release> {
        (1..=3)
            .map(|id| Release {
                id,
                tag_name: format!("v{}", id),
                draft: true,
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_delete_dry_run_prints_selection() {
        let mut api = MockReleaseApi::new();
        api.expect_list_releases().returning(|_, _| {
            Ok(Page {
                items: drafts(),
                next_page: 0,
            })
        });
        api.expect_delete_release().never();
        api.expect_delete_tag().never();
        let ctx = ExecutionContext::default();
        let mut out = Vec::new();

        delete(
            &api,
            &ctx,
            &DeleteRequest::Bulk(BulkSelector::Drafts),
            &DeleteOptions::default(),
            &mut out,
        )
        .await
        .unwrap();

        let printed: Vec<Release> = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, drafts());
    }

    #[tokio::test]
    async fn test_delete_partial_failure_prints_completed() {
        let mut api = MockReleaseApi::new();
        api.expect_list_releases().returning(|_, _| {
            Ok(Page {
                items: drafts(),
                next_page: 0,
            })
        });
        api.expect_delete_release().returning(|id| {
            if id == 2 {
                Err(AdminError::Transport(TransportError::ShortRead {
                    expected: 10,
                    actual: 4,
                }))
            } else {
                Ok(())
            }
        });
        api.expect_delete_tag().returning(|_| Ok(()));
        let ctx = ExecutionContext::default();
        let options = DeleteOptions {
            dry_run: false,
            ..Default::default()
        };
        let mut out = Vec::new();

        let err = delete(
            &api,
            &ctx,
            &DeleteRequest::Bulk(BulkSelector::Drafts),
            &options,
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AdminError>(),
            Some(AdminError::PartialFailure { .. })
        ));
        let printed: Vec<Release> = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed.len(), 1);
        assert_eq!(printed[0].id, 1);
    }

    #[tokio::test]
    async fn test_delete_not_found_prints_nothing() {
        let mut api = MockReleaseApi::new();
        api.expect_get_release().returning(|_| Ok(None));
        let ctx = ExecutionContext::default();
        let mut out = Vec::new();

        let err = delete(
            &api,
            &ctx,
            &DeleteRequest::ById(9),
            &DeleteOptions::default(),
            &mut out,
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "release 9 not found");
        assert!(out.is_empty());
    }
}
