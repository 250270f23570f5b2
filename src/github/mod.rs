mod client;
mod repo;
mod types;

#[cfg(test)]
pub use client::MockReleaseApi;
pub use client::{GitHub, ReleaseApi};
pub use repo::{RepoId, TagTarget, parse_release_id};
pub use types::{
    Asset, Author, Branch, CommitRef, CompareStatus, Comparison, GitActor, NewRelease, Page,
    Release,
};
