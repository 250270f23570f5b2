//! Delete action - removes releases together with their tags.

use futures_util::TryStreamExt;
use log::{debug, info};

use crate::context::ExecutionContext;
use crate::error::{AdminError, Result};
use crate::fetch::{self, DEFAULT_ITEMS_PER_PAGE};
use crate::github::{Release, ReleaseApi, TagTarget};
use crate::selection::{BranchOracle, MatchMode, ReleaseFilter, StateFilter, TagMatcher};

/// Sets of releases that can be removed in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkSelector {
    /// Releases whose target is not covered by any branch.
    Unbranched,
    Drafts,
    PreReleases,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    ById(u64),
    ByTag {
        tag: TagTarget,
        mode: MatchMode,
        draft: bool,
        prerelease: bool,
    },
    Bulk(BulkSelector),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOptions {
    pub dry_run: bool,
    pub items_per_page: u32,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

pub struct DeleteAction<'a, A: ReleaseApi + ?Sized> {
    api: &'a A,
    ctx: &'a ExecutionContext,
}

impl<'a, A: ReleaseApi + ?Sized> DeleteAction<'a, A> {
    pub fn new(api: &'a A, ctx: &'a ExecutionContext) -> Self {
        Self { api, ctx }
    }

    /// Deletes every release selected by `request` and returns them; in a
    /// dry run, returns what would have been deleted.
    ///
    /// Targets are chosen before the first deletion. A failure after some
    /// deletions is reported as `PartialFailure`.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, request: &DeleteRequest, options: &DeleteOptions) -> Result<Vec<Release>> {
        let targets = self.select(request, options).await?;
        self.delete_all(targets, options.dry_run).await
    }

    async fn select(&self, request: &DeleteRequest, options: &DeleteOptions) -> Result<Vec<Release>> {
        match request {
            DeleteRequest::ById(id) => {
                let release = self
                    .api
                    .get_release(*id)
                    .await?
                    .ok_or_else(|| AdminError::NotFound(format!("release {}", id)))?;
                Ok(vec![release])
            }
            DeleteRequest::ByTag {
                tag,
                mode,
                draft,
                prerelease,
            } => {
                let filter = ReleaseFilter::new(StateFilter::only(*draft, *prerelease))
                    .with_target(tag.target.clone());

                if !mode.is_pattern() {
                    return match self.api.get_release_by_tag(&tag.tag).await? {
                        Some(release) if filter.matches(&release) => Ok(vec![release]),
                        _ => Err(AdminError::NotFound(format!("release {}", tag))),
                    };
                }

                let filter = filter.with_tag(TagMatcher::compile(&tag.tag, *mode)?);
                let matched = self
                    .collect(options.items_per_page, |release| filter.matches(release))
                    .await?;
                if matched.is_empty() {
                    return Err(AdminError::NotFound(format!(
                        "release matching {:?}",
                        tag.tag
                    )));
                }
                Ok(matched)
            }
            DeleteRequest::Bulk(BulkSelector::Drafts) => {
                let filter = ReleaseFilter::new(StateFilter::only(true, false));
                self.collect_some(options.items_per_page, "draft release", |r| filter.matches(r))
                    .await
            }
            DeleteRequest::Bulk(BulkSelector::PreReleases) => {
                let filter = ReleaseFilter::new(StateFilter::only(false, true));
                self.collect_some(options.items_per_page, "prerelease", |r| filter.matches(r))
                    .await
            }
            DeleteRequest::Bulk(BulkSelector::Unbranched) => {
                let oracle = BranchOracle::new(self.api).with_per_page(options.items_per_page);
                let releases = fetch::releases(self.api, options.items_per_page);
                futures_util::pin_mut!(releases);

                let mut matched = Vec::new();
                while let Some((release, _)) = releases.try_next().await? {
                    self.ctx.check()?;
                    if oracle.is_unbranched(&release).await? {
                        matched.push(release);
                    } else {
                        debug!(
                            "ignore the release associated with a branch: {}",
                            release.id
                        );
                    }
                }
                if matched.is_empty() {
                    return Err(AdminError::NotFound("unbranched release".to_string()));
                }
                Ok(matched)
            }
        }
    }

    async fn collect<F>(&self, per_page: u32, mut keep: F) -> Result<Vec<Release>>
    where
        F: FnMut(&Release) -> bool,
    {
        let mut matched = Vec::new();
        let releases = fetch::releases(self.api, per_page);
        fetch::fetch(releases, |release, _| {
            self.ctx.check()?;
            if keep(&release) {
                matched.push(release);
            }
            Ok(std::ops::ControlFlow::Continue(()))
        })
        .await?;
        Ok(matched)
    }

    async fn collect_some<F>(&self, per_page: u32, what: &str, keep: F) -> Result<Vec<Release>>
    where
        F: FnMut(&Release) -> bool,
    {
        let matched = self.collect(per_page, keep).await?;
        if matched.is_empty() {
            return Err(AdminError::NotFound(what.to_string()));
        }
        Ok(matched)
    }

    async fn delete_all(&self, targets: Vec<Release>, dry_run: bool) -> Result<Vec<Release>> {
        let mut completed = Vec::with_capacity(targets.len());
        for release in targets {
            if let Err(e) = self.delete_one(&release, dry_run, &mut completed).await {
                return Err(e.after(completed));
            }
        }
        Ok(completed)
    }

    async fn delete_one(
        &self,
        release: &Release,
        dry_run: bool,
        completed: &mut Vec<Release>,
    ) -> Result<()> {
        self.ctx.check()?;
        self.ctx.dump(&format!("delete release {}", release.id), release);
        info!(
            "delete release {} ({}){}",
            release.id,
            release.tag_name,
            if dry_run { " [dry-run]" } else { "" }
        );

        if dry_run {
            completed.push(release.clone());
            return Ok(());
        }

        self.api.delete_release(release.id).await?;
        completed.push(release.clone());
        self.api.delete_tag(&release.tag_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{GitHub, MockReleaseApi, Page, RepoId};
    use crate::http::HttpClient;
    use mockall::predicate::eq;
    use reqwest::Client;

    fn release(id: u64, tag: &str, draft: bool, prerelease: bool) -> Release {
        Release {
            id,
            tag_name: tag.to_string(),
            target_commitish: "main".to_string(),
            draft,
            prerelease,
            ..Default::default()
        }
    }

    fn one_page(api: &mut MockReleaseApi, items: Vec<Release>) {
        api.expect_list_releases()
            .with(eq(DEFAULT_ITEMS_PER_PAGE), eq(1))
            .returning(move |_, _| {
                Ok(Page {
                    items: items.clone(),
                    next_page: 0,
                })
            });
    }

    fn live() -> DeleteOptions {
        DeleteOptions {
            dry_run: false,
            ..Default::default()
        }
    }

    fn ids(releases: &[Release]) -> Vec<u64> {
        releases.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_delete_by_id_twice_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/repos/owner/repo/releases/5")
            .with_status(200)
            .with_body(r#"{"id": 5, "tag_name": "v5"}"#)
            .expect(1)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/repos/owner/repo/releases/5")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let delete_tag = server
            .mock("DELETE", "/repos/owner/repo/git/refs/tags/v5")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let ctx = ExecutionContext::default();
        let repo: RepoId = "owner/repo".parse().unwrap();
        let github = GitHub::new(
            HttpClient::new(
                Client::new(),
                format!("{}{}", server.url(), repo.base_path()),
                ctx.clone(),
            ),
            repo,
        );
        let action = DeleteAction::new(&github, &ctx);

        let deleted = action.run(&DeleteRequest::ById(5), &live()).await.unwrap();
        assert_eq!(ids(&deleted), vec![5]);
        get.assert_async().await;
        delete.assert_async().await;
        delete_tag.assert_async().await;

        // The release is gone now.
        get.remove_async().await;
        let _gone = server
            .mock("GET", "/repos/owner/repo/releases/5")
            .with_status(404)
            .create_async()
            .await;
        let err = action
            .run(&DeleteRequest::ById(5), &live())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_by_exact_tag_respects_filters() {
        let mut api = MockReleaseApi::new();
        api.expect_get_release_by_tag()
            .with(eq("v1"))
            .returning(|_| Ok(Some(release(1, "v1", false, false))));
        api.expect_delete_release().never();
        let ctx = ExecutionContext::default();

        let request = DeleteRequest::ByTag {
            tag: "v1".parse().unwrap(),
            mode: MatchMode::Plain,
            draft: true,
            prerelease: false,
        };
        let err = DeleteAction::new(&api, &ctx)
            .run(&request, &live())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_by_exact_tag_and_target() {
        let mut api = MockReleaseApi::new();
        api.expect_get_release_by_tag()
            .with(eq("v1"))
            .returning(|_| Ok(Some(release(1, "v1", false, false))));
        api.expect_delete_release()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(()));
        api.expect_delete_tag()
            .with(eq("v1"))
            .times(1)
            .returning(|_| Ok(()));
        let ctx = ExecutionContext::default();

        let request = DeleteRequest::ByTag {
            tag: "v1@main".parse().unwrap(),
            mode: MatchMode::Plain,
            draft: false,
            prerelease: false,
        };
        let deleted = DeleteAction::new(&api, &ctx)
            .run(&request, &live())
            .await
            .unwrap();

        assert_eq!(ids(&deleted), vec![1]);
    }

    #[tokio::test]
    async fn test_delete_by_regex_selects_before_deleting() {
        let mut api = MockReleaseApi::new();
        one_page(
            &mut api,
            vec![
                release(3, "v1.2-rc1", false, true),
                release(2, "v1.1", false, false),
                release(1, "v1.0-rc1", false, true),
            ],
        );
        let mut seq = mockall::Sequence::new();
        for (id, tag) in [(3, "v1.2-rc1"), (1, "v1.0-rc1")] {
            api.expect_delete_release()
                .with(eq(id))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
            api.expect_delete_tag()
                .with(eq(tag))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        let ctx = ExecutionContext::default();

        let request = DeleteRequest::ByTag {
            tag: "-rc[0-9]+$".parse().unwrap(),
            mode: MatchMode::Posix,
            draft: false,
            prerelease: true,
        };
        let deleted = DeleteAction::new(&api, &ctx)
            .run(&request, &live())
            .await
            .unwrap();

        assert_eq!(ids(&deleted), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_invalid_pattern_fails_before_any_request() {
        let mut api = MockReleaseApi::new();
        api.expect_list_releases().never();
        let ctx = ExecutionContext::default();

        let request = DeleteRequest::ByTag {
            tag: r"\d+".parse().unwrap(),
            mode: MatchMode::Posix,
            draft: false,
            prerelease: false,
        };
        let err = DeleteAction::new(&api, &ctx)
            .run(&request, &live())
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_bulk_drafts_dry_run() {
        let mut api = MockReleaseApi::new();
        one_page(
            &mut api,
            vec![
                release(3, "v3", true, false),
                release(2, "v2", false, false),
                release(1, "v1", true, true),
            ],
        );
        api.expect_delete_release().never();
        api.expect_delete_tag().never();
        let ctx = ExecutionContext::default();

        let deleted = DeleteAction::new(&api, &ctx)
            .run(
                &DeleteRequest::Bulk(BulkSelector::Drafts),
                &DeleteOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(ids(&deleted), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_bulk_prereleases_none_is_not_found() {
        let mut api = MockReleaseApi::new();
        one_page(&mut api, vec![release(1, "v1", false, false)]);
        let ctx = ExecutionContext::default();

        let err = DeleteAction::new(&api, &ctx)
            .run(&DeleteRequest::Bulk(BulkSelector::PreReleases), &live())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_bulk_unbranched() {
        let mut api = MockReleaseApi::new();
        let mut on_main = release(2, "v2", false, false);
        on_main.target_commitish = "main".into();
        let mut on_gone = release(1, "v1", false, false);
        on_gone.target_commitish = "feature-gone".into();
        one_page(&mut api, vec![on_main, on_gone]);
        api.expect_get_branch()
            .with(eq("main"))
            .returning(|name| {
                Ok(Some(crate::github::Branch {
                    name: name.to_string(),
                    ..Default::default()
                }))
            });
        api.expect_get_branch()
            .with(eq("feature-gone"))
            .returning(|_| Ok(None));
        api.expect_delete_release()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(()));
        api.expect_delete_tag()
            .with(eq("v1"))
            .times(1)
            .returning(|_| Ok(()));
        let ctx = ExecutionContext::default();

        let deleted = DeleteAction::new(&api, &ctx)
            .run(&DeleteRequest::Bulk(BulkSelector::Unbranched), &live())
            .await
            .unwrap();

        assert_eq!(ids(&deleted), vec![1]);
    }

    #[tokio::test]
    async fn test_failure_midway_reports_completed() {
        let mut api = MockReleaseApi::new();
        one_page(
            &mut api,
            vec![release(2, "v2", true, false), release(1, "v1", true, false)],
        );
        api.expect_delete_release()
            .with(eq(2))
            .returning(|_| Ok(()));
        api.expect_delete_tag().returning(|_| Ok(()));
        api.expect_delete_release()
            .with(eq(1))
            .returning(|_| Err(AdminError::Cancelled));
        let ctx = ExecutionContext::default();

        let err = DeleteAction::new(&api, &ctx)
            .run(&DeleteRequest::Bulk(BulkSelector::Drafts), &live())
            .await
            .unwrap_err();

        match err {
            AdminError::PartialFailure { completed, source } => {
                assert_eq!(ids(&completed), vec![2]);
                assert!(matches!(*source, AdminError::Cancelled));
            }
            other => panic!("Expected PartialFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_failure_is_returned_as_is() {
        let mut api = MockReleaseApi::new();
        api.expect_get_release()
            .returning(|id| Ok(Some(release(id, "v9", false, false))));
        api.expect_delete_release()
            .returning(|_| Err(AdminError::NotFound("release".into())));
        let ctx = ExecutionContext::default();

        let err = DeleteAction::new(&api, &ctx)
            .run(&DeleteRequest::ById(9), &live())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
