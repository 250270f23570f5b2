//! Execution context threaded through every workflow.

use tokio_util::sync::CancellationToken;

use crate::error::{AdminError, Result};

/// Per-run settings shared by the transport and the workflows.
///
/// Built once at the top level; clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Dump the JSON of every release and asset acted on.
    pub verbose: bool,
    cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            cancel: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fails with `Cancelled` once the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AdminError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs `fut` unless the token fires first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AdminError::Cancelled),
            result = fut => result,
        }
    }

    /// Logs `value` as pretty JSON when running verbosely.
    pub fn dump<T: serde::Serialize>(&self, label: &str, value: &T) {
        if !self.verbose {
            return;
        }
        match serde_json::to_string_pretty(value) {
            Ok(json) => log::info!("{}: {}", label, json),
            Err(e) => log::warn!("{}: failed to stringify: {}", label, e),
        }
    }
}
