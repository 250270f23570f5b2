//! Repository, API root and token resolved from flags and the environment.

use log::debug;

use crate::error::{AdminError, Result};
use crate::github::RepoId;
use crate::http::{DEFAULT_API_URL, validate_api_url};
use crate::runtime::{Runtime, env_value};

pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_API_URL: &str = "GITHUB_API_URL";

/// Settings resolved from flags and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repo: RepoId,
    /// API root without trailing slash.
    pub api_url: String,
    pub token: Option<String>,
}

impl Config {
    /// Flags win over `GITHUB_REPOSITORY` and `GITHUB_API_URL`; the token
    /// only comes from `GITHUB_TOKEN`.
    pub fn load<R: Runtime + ?Sized>(
        runtime: &R,
        repo: Option<&str>,
        api_url: Option<&str>,
    ) -> Result<Self> {
        let flag = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(String::from);

        let repo = flag(repo)
            .or_else(|| env_value(runtime, ENV_REPOSITORY))
            .ok_or_else(|| {
                AdminError::InvalidArgument(format!(
                    "repository is not specified, use --repo or {}",
                    ENV_REPOSITORY
                ))
            })?
            .parse::<RepoId>()?;

        let api_url = match flag(api_url)
            .map(|url| (url, "--api-url"))
            .or_else(|| env_value(runtime, ENV_API_URL).map(|url| (url, ENV_API_URL)))
        {
            Some((url, source)) => validate_api_url(&url, source)?,
            None => DEFAULT_API_URL.to_string(),
        };

        let token = env_value(runtime, ENV_TOKEN);
        if let Some(token) = &token {
            debug!("Using {} for authentication: {}", ENV_TOKEN, mask(token));
        }

        Ok(Self {
            repo,
            api_url,
            token,
        })
    }

    /// `{api_url}/repos/{owner}/{repo}`
    pub fn base_url(&self) -> String {
        format!("{}{}", self.api_url, self.repo.base_path())
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::collections::HashMap;
    use std::env::VarError;

    fn runtime_with(vars: &[(&'static str, &'static str)]) -> MockRuntime {
        let vars: HashMap<&'static str, &'static str> = vars.iter().copied().collect();
        let mut runtime = MockRuntime::new();
        runtime.expect_env_var().returning(move |key| {
            vars.get(key)
                .map(|v| v.to_string())
                .ok_or(VarError::NotPresent)
        });
        runtime
    }

    #[test]
    fn test_load_from_flags() {
        let runtime = runtime_with(&[("GITHUB_REPOSITORY", "env/repo")]);

        let config = Config::load(&runtime, Some("flag/repo"), Some("http://localhost:9000/")).unwrap();

        assert_eq!(config.repo.to_string(), "flag/repo");
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.token, None);
        assert_eq!(config.base_url(), "http://localhost:9000/repos/flag/repo");
    }

    #[test]
    fn test_load_from_environment() {
        let runtime = runtime_with(&[
            ("GITHUB_REPOSITORY", " env/repo "),
            ("GITHUB_API_URL", "https://ghe.example.com"),
            ("GITHUB_TOKEN", "ghp_abcdefghijklmnop"),
        ]);

        let config = Config::load(&runtime, None, None).unwrap();

        assert_eq!(config.repo.to_string(), "env/repo");
        assert_eq!(config.api_url, "https://ghe.example.com");
        assert_eq!(config.token.as_deref(), Some("ghp_abcdefghijklmnop"));
    }

    #[test]
    fn test_load_defaults_api_url() {
        let runtime = runtime_with(&[("GITHUB_API_URL", "   ")]);

        let config = Config::load(&runtime, Some("o/r"), None).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_load_missing_repo() {
        let runtime = runtime_with(&[]);

        let err = Config::load(&runtime, Some("  "), None).unwrap_err();

        assert!(matches!(err, AdminError::InvalidArgument(_)));
    }

    #[test]
    fn test_load_invalid_values() {
        let runtime = runtime_with(&[("GITHUB_API_URL", "https://example.com/api")]);

        assert!(matches!(
            Config::load(&runtime, Some("o/r"), None).unwrap_err(),
            AdminError::InvalidConfiguration(_)
        ));
        assert!(matches!(
            Config::load(&runtime, Some("-bad/r"), Some("https://x.example")).unwrap_err(),
            AdminError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_invalid_api_url_names_its_source() {
        let runtime = runtime_with(&[("GITHUB_API_URL", "https://ghe.example.com/api/v3")]);

        let from_env = Config::load(&runtime, Some("o/r"), None).unwrap_err();
        assert!(from_env.to_string().contains("GITHUB_API_URL"));

        let from_flag = Config::load(&runtime, Some("o/r"), Some("ftp-less")).unwrap_err();
        assert!(from_flag.to_string().contains("--api-url"));
        assert!(!from_flag.to_string().contains("GITHUB_API_URL"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "*****");
        assert_eq!(mask("ghp_abcdefghijklmnop"), "ghp_*********mnop");
    }
}
