//! Predicates deciding which releases a request applies to.

mod branch;

pub use branch::{BranchOracle, looks_like_sha};

use log::debug;
use regex::Regex;

use crate::error::{AdminError, Result};
use crate::github::Release;

/// How a tag or file name pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Exact string equality.
    #[default]
    Plain,
    /// Perl-style regular expression.
    Regex,
    /// POSIX extended regular expression (egrep).
    Posix,
}

impl MatchMode {
    /// `--posix` wins over `--regex`.
    pub fn from_flags(regex: bool, posix: bool) -> Self {
        if posix {
            MatchMode::Posix
        } else if regex {
            MatchMode::Regex
        } else {
            MatchMode::Plain
        }
    }

    pub fn is_pattern(&self) -> bool {
        !matches!(self, MatchMode::Plain)
    }
}

/// A compiled name matcher. Pattern matching is unanchored.
#[derive(Debug, Clone)]
pub enum TagMatcher {
    Exact(String),
    Pattern { source: String, regex: Regex },
}

impl TagMatcher {
    pub fn compile(pattern: &str, mode: MatchMode) -> Result<Self> {
        let invalid = |reason: String| AdminError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        match mode {
            MatchMode::Plain => Ok(TagMatcher::Exact(pattern.to_string())),
            MatchMode::Regex | MatchMode::Posix => {
                if mode == MatchMode::Posix {
                    check_posix_syntax(pattern).map_err(invalid)?;
                }
                let regex = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
                Ok(TagMatcher::Pattern {
                    source: pattern.to_string(),
                    regex,
                })
            }
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            TagMatcher::Exact(expected) => expected == value,
            TagMatcher::Pattern { regex, .. } => regex.is_match(value),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TagMatcher::Exact(s) => s,
            TagMatcher::Pattern { source, .. } => source,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, TagMatcher::Pattern { .. })
    }
}

fn is_perl_escape(c: char) -> bool {
    "dDwWsSbBAzZpPQEkKRhHvVxuUG".contains(c) || c.is_ascii_digit()
}

/// Rejects constructs outside POSIX ERE: Perl class escapes (inside
/// brackets too), `(?...)` groups and lazy quantifiers.
fn check_posix_syntax(pattern: &str) -> std::result::Result<(), String> {
    let mut chars = pattern.chars().peekable();
    let mut in_bracket = false;
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        if in_bracket {
            if let Some(&escaped) = chars.peek().filter(|&&e| c == '\\' && is_perl_escape(e)) {
                return Err(format!("\\{} in a bracket is not POSIX ERE syntax", escaped));
            }
            if c == ']' && prev != Some('[') && prev != Some('^') {
                in_bracket = false;
            }
            prev = Some(c);
            continue;
        }

        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    return Err("trailing backslash".to_string());
                };
                if is_perl_escape(escaped) {
                    return Err(format!("\\{} is not POSIX ERE syntax", escaped));
                }
                prev = Some(escaped);
                continue;
            }
            '[' => in_bracket = true,
            '(' if chars.peek() == Some(&'?') => {
                return Err("(? groups are not POSIX ERE syntax".to_string());
            }
            '?' | '*' | '+' | '}' if chars.peek() == Some(&'?') => {
                return Err("lazy quantifiers are not POSIX ERE syntax".to_string());
            }
            _ => {}
        }
        prev = Some(c);
    }

    if in_bracket {
        return Err("missing closing ]".to_string());
    }
    Ok(())
}

/// Which draft/prerelease states are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    /// Neither draft nor prerelease.
    Stable,
    /// Every state.
    Any,
    /// Every flag that is set must be set on the release.
    Only { draft: bool, prerelease: bool },
}

impl StateFilter {
    /// Listing semantics: no flag means stable releases only, both flags
    /// mean everything.
    pub fn listing(draft: bool, prerelease: bool) -> Self {
        match (draft, prerelease) {
            (false, false) => StateFilter::Stable,
            (true, true) => StateFilter::Any,
            (draft, prerelease) => StateFilter::Only { draft, prerelease },
        }
    }

    /// Deletion semantics: no flag means any state.
    pub fn only(draft: bool, prerelease: bool) -> Self {
        if !draft && !prerelease {
            StateFilter::Any
        } else {
            StateFilter::Only { draft, prerelease }
        }
    }

    pub fn accepts(&self, release: &Release) -> bool {
        match *self {
            StateFilter::Stable => !release.draft && !release.prerelease,
            StateFilter::Any => true,
            StateFilter::Only { draft, prerelease } => {
                (!draft || release.draft) && (!prerelease || release.prerelease)
            }
        }
    }
}

/// State, target and tag conditions combined.
#[derive(Debug, Clone)]
pub struct ReleaseFilter {
    pub state: StateFilter,
    pub target: Option<String>,
    pub tag: Option<TagMatcher>,
}

impl ReleaseFilter {
    pub fn new(state: StateFilter) -> Self {
        Self {
            state,
            target: None,
            tag: None,
        }
    }

    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target.filter(|t| !t.is_empty());
        self
    }

    pub fn with_tag(mut self, tag: TagMatcher) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn matches(&self, release: &Release) -> bool {
        if !self.state.accepts(release) {
            debug!(
                "ignore release {} (draft={}, prerelease={}): state does not match {:?}",
                release.id, release.draft, release.prerelease, self.state
            );
            return false;
        }
        if let Some(target) = &self.target {
            if *target != release.target_commitish {
                debug!(
                    "ignore release {}: commitish {:?} does not match {:?}",
                    release.id, release.target_commitish, target
                );
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !tag.is_match(&release.tag_name) {
                debug!(
                    "ignore release {}: tag {:?} does not match {:?}",
                    release.id,
                    release.tag_name,
                    tag.as_str()
                );
                return false;
            }
        }
        true
    }
}
