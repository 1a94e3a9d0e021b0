// ── Core error types ──
//
// Errors surfaced by the coordinator. Mutator and explicit-refresh
// failures propagate to the caller; periodic poll failures are recorded
// and swallowed at the loop boundary (the previous snapshot stays).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A poll cycle exceeded its bounded duration. The previous snapshot
    /// is retained and the loop continues on its normal schedule.
    #[error("Poll timed out after {timeout_secs}s")]
    PollTimeout { timeout_secs: u64 },

    /// An API-level failure (authentication, transport, device endpoint).
    #[error(transparent)]
    Api(#[from] blueair_api::Error),
}

impl CoreError {
    /// Returns `true` if the underlying failure means the device is gone
    /// from the account, as opposed to the service being broken.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_not_found())
    }
}
