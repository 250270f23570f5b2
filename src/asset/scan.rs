use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{AdminError, Result};
use crate::runtime::Runtime;
use crate::selection::TagMatcher;

/// Lists the regular files of `dir` whose names satisfy `matcher`,
/// sorted by file name.
#[tracing::instrument(skip(runtime, matcher))]
pub fn scan<R: Runtime + ?Sized>(
    runtime: &R,
    dir: &Path,
    matcher: &TagMatcher,
) -> Result<Vec<PathBuf>> {
    let entries = runtime.read_dir(dir).map_err(|source| AdminError::LocalIo {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .into_iter()
        .filter(|path| {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            if !matcher.is_match(name) {
                return false;
            }
            if !runtime.is_file(path) {
                debug!("skipping {:?}: not a regular file", path);
                return false;
            }
            true
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!("{} file(s) in {:?} match {:?}", files.len(), dir, matcher.as_str());
    Ok(files)
}
