//! List action - releases matching a state and branch view.

use futures_util::TryStreamExt;
use log::debug;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::fetch::{self, DEFAULT_ITEMS_PER_PAGE};
use crate::github::{Release, ReleaseApi};
use crate::selection::{BranchOracle, ReleaseFilter, StateFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub state: StateFilter,
    /// Only releases whose target commitish equals this name.
    pub branch: Option<String>,
    /// Only releases whose target commitish is an existing branch or a
    /// commit contained in one.
    pub branch_exists: bool,
    /// Stop after this many matches; 0 means no limit.
    pub max_items: usize,
    pub items_per_page: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            state: StateFilter::Stable,
            branch: None,
            branch_exists: false,
            max_items: 0,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

pub struct ListAction<'a, A: ReleaseApi + ?Sized> {
    api: &'a A,
    ctx: &'a ExecutionContext,
}

impl<'a, A: ReleaseApi + ?Sized> ListAction<'a, A> {
    pub fn new(api: &'a A, ctx: &'a ExecutionContext) -> Self {
        Self { api, ctx }
    }

    /// Releases in server order that pass every filter.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, options: &ListOptions) -> Result<Vec<Release>> {
        let filter = ReleaseFilter::new(options.state).with_target(options.branch.clone());
        let oracle = BranchOracle::new(self.api).with_per_page(options.items_per_page);

        let releases = fetch::releases(self.api, options.items_per_page);
        futures_util::pin_mut!(releases);

        let mut listed = Vec::new();
        while let Some((release, _)) = releases.try_next().await? {
            self.ctx.check()?;
            if !filter.matches(&release) {
                continue;
            }
            if options.branch_exists && !oracle.is_covered(&release.target_commitish).await? {
                debug!(
                    "ignore release {}: no branch holds {:?}",
                    release.id, release.target_commitish
                );
                continue;
            }

            listed.push(release);
            if options.max_items > 0 && listed.len() >= options.max_items {
                break;
            }
        }

        Ok(listed)
    }
}
