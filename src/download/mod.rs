//! Staging of downloaded bytes next to their destination.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{AdminError, Result, TransportError};

/// A download in progress.
///
/// Bytes go to a temporary file in the destination's directory; the file
/// only appears under its final name once `finish` has checked the size.
/// Dropping an unfinished download removes the temporary file.
pub struct PartialFile {
    file: NamedTempFile,
    dest: PathBuf,
    written: u64,
}

impl PartialFile {
    pub fn create(dest: &Path) -> Result<Self> {
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = tempfile::Builder::new()
            .prefix(".ghra-download-")
            .tempfile_in(dir)
            .map_err(|source| AdminError::LocalIo {
                path: dir.to_path_buf(),
                source,
            })?;
        debug!("Staging download of {:?} in {:?}", dest, file.path());

        Ok(Self {
            file,
            dest: dest.to_path_buf(),
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .map_err(|source| AdminError::LocalIo {
                path: self.file.path().to_path_buf(),
                source,
            })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Checks the byte count against `expected` and renames the file into
    /// place. Returns the number of bytes written.
    pub fn finish(mut self, expected: Option<u64>) -> Result<u64> {
        if let Some(expected) = expected.filter(|&n| n != self.written) {
            return Err(TransportError::ShortRead {
                expected,
                actual: self.written,
            }
            .into());
        }

        self.file.flush().map_err(|source| AdminError::LocalIo {
            path: self.file.path().to_path_buf(),
            source,
        })?;
        let written = self.written;
        let dest = self.dest;
        self.file
            .persist(&dest)
            .map_err(|e| AdminError::LocalIo {
                path: dest.clone(),
                source: e.error,
            })?;

        debug!(
            "Saved {:?} ({:.2} MB)",
            dest,
            written as f64 / (1024.0 * 1024.0)
        );
        Ok(written)
    }
}
