//! Exports `GHRA_VERSION` for `--version` and the API user agent.
//!
//! Order of preference: a `GHRA_VERSION` set by the packager, the nearest
//! release tag from `git describe` (without its `v`), then the manifest
//! version marked as an untagged build.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
    println!("cargo:rerun-if-env-changed=GHRA_VERSION");

    let version = std::env::var("GHRA_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(release_tag)
        .unwrap_or_else(|| {
            let manifest = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
            format!("{}+untagged", manifest)
        });

    println!("cargo:rustc-env=GHRA_VERSION={}", version.trim());
}

/// `v1.4.0-3-gabc1234-dirty` becomes `1.4.0-3-gabc1234-dirty`.
fn release_tag() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--match", "v[0-9]*", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let tag = described.trim();
    let version = tag.strip_prefix('v').unwrap_or(tag);
    (!version.is_empty()).then(|| version.to_string())
}
