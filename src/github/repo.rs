use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::AdminError;

static OWNER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("valid owner pattern"));
static REPO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-][\w.-]*$").expect("valid repo pattern"));

/// A repository identifier in `owner/repo` form.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    /// The API path prefix for this repository.
    pub fn base_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AdminError::InvalidArgument(
                "repo name must not be empty".to_string(),
            ));
        }
        let invalid = || AdminError::InvalidArgument(format!("invalid repo name {:?}", s));

        let (owner, repo) = s.split_once('/').ok_or_else(invalid)?;
        if repo.contains('/') {
            return Err(invalid());
        }
        if owner.starts_with('-') || owner.ends_with('-') || !OWNER_NAME.is_match(owner) {
            return Err(invalid());
        }
        if !REPO_NAME.is_match(repo) {
            return Err(invalid());
        }

        Ok(RepoId {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

/// A `<tag>[@<target>]` argument.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TagTarget {
    pub tag: String,
    pub target: Option<String>,
}

impl std::fmt::Display for TagTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Some(t) => write!(f, "{}@{}", self.tag, t),
            None => write!(f, "{}", self.tag),
        }
    }
}

impl FromStr for TagTarget {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AdminError::InvalidArgument(format!("invalid <tag>[@<target>] {:?}", s));
        let parts: Vec<&str> = s.split('@').map(str::trim).collect();
        match parts.as_slice() {
            [tag] if !tag.is_empty() => Ok(TagTarget {
                tag: tag.to_string(),
                target: None,
            }),
            [tag, target] if !tag.is_empty() && !target.is_empty() => Ok(TagTarget {
                tag: tag.to_string(),
                target: Some(target.to_string()),
            }),
            _ => Err(invalid()),
        }
    }
}

/// Parses a release id, which must be greater than zero.
pub fn parse_release_id(s: &str) -> Result<u64, AdminError> {
    match s.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(AdminError::InvalidArgument(
            "<release-id> must be greater than 0".to_string(),
        )),
        Err(e) => Err(AdminError::InvalidArgument(format!(
            "invalid <release-id> {:?}: {}",
            s, e
        ))),
    }
}
