//! Application layer - release workflows built on the API and selection engine.
//!
//! Each action borrows a `ReleaseApi` and the shared `ExecutionContext`, and
//! returns data for the command layer to render.

mod create;
mod delete;
mod download;
mod list;

pub use create::{CreateAction, CreateOptions, CreateOutcome};
pub use delete::{BulkSelector, DeleteAction, DeleteOptions, DeleteRequest};
pub use download::{DownloadAction, DownloadOptions, DownloadOutcome, DownloadRequest};
pub use list::{ListAction, ListOptions};
