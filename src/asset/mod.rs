//! Local asset files: discovery and upload preparation.

mod scan;
mod sniff;

pub use scan::scan;
pub use sniff::{SNIFF_LEN, detect_content_type};

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{AdminError, Result};

/// A local file opened for upload, with its size and sniffed MIME type.
#[derive(Debug)]
pub struct LocalAsset {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: &'static str,
    pub file: tokio::fs::File,
}

impl LocalAsset {
    /// Opens `path`, reads it through once to measure it and sniff its
    /// type, then rewinds it for streaming.
    pub async fn open(path: &Path) -> Result<Self> {
        let io_error = |source| AdminError::LocalIo {
            path: path.to_path_buf(),
            source,
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AdminError::InvalidArgument(format!("invalid file name {:?}", path)))?
            .to_string();

        let mut file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        let mut buf = vec![0u8; 64 * 1024];
        let mut size: u64 = 0;
        loop {
            let n = file.read(&mut buf).await.map_err(io_error)?;
            if n == 0 {
                break;
            }
            if head.len() < SNIFF_LEN {
                let take = n.min(SNIFF_LEN - head.len());
                head.extend_from_slice(&buf[..take]);
            }
            size += n as u64;
        }
        file.seek(SeekFrom::Start(0)).await.map_err(io_error)?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size,
            mime: detect_content_type(&head),
            file,
        })
    }
}
