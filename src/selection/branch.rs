use futures_util::TryStreamExt;
use log::debug;

use crate::error::Result;
use crate::fetch;
use crate::github::{Release, ReleaseApi};

/// True for strings shaped like an abbreviated or full commit SHA.
pub fn looks_like_sha(s: &str) -> bool {
    (7..=40).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Answers branch questions about release targets against the live API.
pub struct BranchOracle<'a, A: ReleaseApi + ?Sized> {
    api: &'a A,
    per_page: u32,
}

impl<'a, A: ReleaseApi + ?Sized> BranchOracle<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            per_page: fetch::DEFAULT_ITEMS_PER_PAGE,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub async fn branch_exists(&self, name: &str) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        Ok(self.api.get_branch(name).await?.is_some())
    }

    /// Whether `commitish` names an existing branch or a commit contained
    /// in one. Containment costs one comparison per branch.
    #[tracing::instrument(skip(self))]
    pub async fn is_covered(&self, commitish: &str) -> Result<bool> {
        if self.branch_exists(commitish).await? {
            debug!("{:?} is an existing branch", commitish);
            return Ok(true);
        }
        if !looks_like_sha(commitish) {
            debug!("{:?} is neither a branch nor a commit", commitish);
            return Ok(false);
        }

        let branches = fetch::branches(self.api, self.per_page);
        futures_util::pin_mut!(branches);
        while let Some((branch, _)) = branches.try_next().await? {
            let Some(comparison) = self.api.compare(&branch.name, commitish).await? else {
                continue;
            };
            if comparison.head_is_covered() {
                debug!(
                    "commit {} is contained in branch {:?} ({:?})",
                    commitish, branch.name, comparison.status
                );
                return Ok(true);
            }
        }

        debug!("commit {} is not contained in any branch", commitish);
        Ok(false)
    }

    pub async fn is_unbranched(&self, release: &Release) -> Result<bool> {
        Ok(!self.is_covered(&release.target_commitish).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdminError;
    use crate::github::{Branch, CompareStatus, Comparison, MockReleaseApi, Page};
    use mockall::predicate::eq;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn branch(name: &str) -> Branch {
        Branch {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn comparison(status: CompareStatus) -> Comparison {
        Comparison {
            status,
            ahead_by: 0,
            behind_by: 0,
        }
    }

    #[test]
    fn test_looks_like_sha() {
        assert!(looks_like_sha("abc1234"));
        assert!(looks_like_sha(SHA));
        assert!(!looks_like_sha("abc123"));
        assert!(!looks_like_sha("main"));
        assert!(!looks_like_sha(&format!("{}0", SHA)));
    }

    #[tokio::test]
    async fn test_existing_branch_is_covered() {
        let mut api = MockReleaseApi::new();
        api.expect_get_branch()
            .with(eq("main"))
            .times(1)
            .returning(|name| Ok(Some(branch(name))));
        api.expect_list_branches().never();

        assert!(BranchOracle::new(&api).is_covered("main").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_branch_name_is_not_covered() {
        let mut api = MockReleaseApi::new();
        api.expect_get_branch().returning(|_| Ok(None));
        api.expect_list_branches().never();

        let oracle = BranchOracle::new(&api);
        assert!(!oracle.is_covered("feature-x").await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_behind_a_branch_is_covered() {
        let mut api = MockReleaseApi::new();
        api.expect_get_branch().returning(|_| Ok(None));
        api.expect_list_branches()
            .with(eq(20), eq(1))
            .times(1)
            .returning(|_, _| {
                Ok(Page {
                    items: vec![branch("dev"), branch("main"), branch("old")],
                    next_page: 0,
                })
            });
        api.expect_compare()
            .with(eq("dev"), eq(SHA))
            .times(1)
            .returning(|_, _| Ok(Some(comparison(CompareStatus::Diverged))));
        api.expect_compare()
            .with(eq("main"), eq(SHA))
            .times(1)
            .returning(|_, _| Ok(Some(comparison(CompareStatus::Behind))));
        api.expect_compare().with(eq("old"), eq(SHA)).never();

        assert!(BranchOracle::new(&api).is_covered(SHA).await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_ahead_of_every_branch_is_unbranched() {
        let mut api = MockReleaseApi::new();
        api.expect_get_branch().returning(|_| Ok(None));
        api.expect_list_branches()
            .with(eq(20), eq(1))
            .returning(|_, _| {
                Ok(Page {
                    items: vec![branch("main")],
                    next_page: 2,
                })
            });
        api.expect_list_branches()
            .with(eq(20), eq(2))
            .returning(|_, _| {
                Ok(Page {
                    items: vec![branch("gone-commit")],
                    next_page: 0,
                })
            });
        api.expect_compare()
            .with(eq("main"), eq(SHA))
            .returning(|_, _| Ok(Some(comparison(CompareStatus::Ahead))));
        api.expect_compare()
            .with(eq("gone-commit"), eq(SHA))
            .returning(|_, _| Ok(None));

        let release = Release {
            id: 1,
            target_commitish: SHA.to_string(),
            ..Default::default()
        };
        assert!(
            BranchOracle::new(&api)
                .is_unbranched(&release)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_identical_commit_is_covered() {
        let mut api = MockReleaseApi::new();
        api.expect_get_branch().returning(|_| Ok(None));
        api.expect_list_branches().returning(|_, _| {
            Ok(Page {
                items: vec![branch("main")],
                next_page: 0,
            })
        });
        api.expect_compare()
            .returning(|_, _| Ok(Some(comparison(CompareStatus::Identical))));

        assert!(BranchOracle::new(&api).is_covered("abc1234").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_commitish_is_not_covered_without_requests() {
        let mut api = MockReleaseApi::new();
        api.expect_get_branch().never();
        api.expect_list_branches().never();

        assert!(!BranchOracle::new(&api).is_covered("").await.unwrap());
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let mut api = MockReleaseApi::new();
        api.expect_get_branch()
            .returning(|_| Err(AdminError::Cancelled));

        let result = BranchOracle::new(&api).is_covered("main").await;
        assert!(matches!(result, Err(AdminError::Cancelled)));
    }
}
