//! Command handlers: run one workflow and print its result as JSON.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

pub mod config;
mod create;
mod delete;
mod download;
mod list;
pub mod services;

pub use create::{AssetSelection, create};
pub use delete::delete;
pub use download::download;
pub use list::list;

/// Write `value` as pretty JSON followed by a newline
pub(crate) fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
