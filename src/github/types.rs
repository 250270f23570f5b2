use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Author {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub site_admin: bool,
}

/// Represents a file attached to a release
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub browser_download_url: String,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub uploader: Option<Author>,
}

/// Represents a GitHub release
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Release {
    #[serde(default)]
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub target_commitish: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Finds an attached asset by exact file name.
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Body of a release creation request.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct NewRelease {
    pub tag_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct GitActor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct CommitRef {
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<GitActor>,
    #[serde(default)]
    pub committer: Option<GitActor>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub commit: Option<CommitRef>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompareStatus {
    Ahead,
    Behind,
    Identical,
    Diverged,
}

/// Result of comparing `base...head`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Comparison {
    pub status: CompareStatus,
    #[serde(default)]
    pub ahead_by: u64,
    #[serde(default)]
    pub behind_by: u64,
}

impl Comparison {
    /// True when `head` is reachable from `base`.
    pub fn head_is_covered(&self) -> bool {
        matches!(
            self.status,
            CompareStatus::Behind | CompareStatus::Identical
        )
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Next page number, 0 when this was the last page.
    pub next_page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deserialize_full() {
        let json = r#"{
            "id": 1,
            "tag_name": "v1.0.0",
            "target_commitish": "main",
            "name": "First",
            "body": "notes",
            "draft": false,
            "prerelease": true,
            "upload_url": "https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}",
            "author": {"login": "octocat", "id": 7, "type": "User"},
            "assets": [
                {"id": 10, "name": "app.tar.gz", "content_type": "application/gzip", "size": 3}
            ]
        }"#;

        let release: Release = serde_json::from_str(json).unwrap();

        assert_eq!(release.id, 1);
        assert_eq!(release.target_commitish, "main");
        assert!(release.prerelease);
        assert_eq!(release.author.unwrap().kind, "User");
        assert_eq!(release.assets[0].size, 3);
    }

    #[test]
    fn test_release_asset_lookup() {
        let release = Release {
            assets: vec![
                Asset {
                    id: 1,
                    name: "a.zip".into(),
                    ..Default::default()
                },
                Asset {
                    id: 2,
                    name: "b.zip".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert_eq!(release.asset("b.zip").map(|a| a.id), Some(2));
        assert!(release.asset("c.zip").is_none());
    }

    #[test]
    fn test_new_release_omits_empty_target() {
        let body = NewRelease {
            tag_name: "v1".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("target_commitish").is_none());
        assert_eq!(json["draft"], false);
    }

    #[test]
    fn test_comparison_covered() {
        let parse = |s: &str| -> Comparison {
            serde_json::from_str(&format!(r#"{{"status": "{}"}}"#, s)).unwrap()
        };
        assert!(parse("behind").head_is_covered());
        assert!(parse("identical").head_is_covered());
        assert!(!parse("ahead").head_is_covered());
        assert!(!parse("diverged").head_is_covered());
    }
}
