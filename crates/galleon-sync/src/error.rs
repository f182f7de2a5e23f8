//! Sync error types.
//!
//! Per-file and per-folder failures never surface here -- they are logged
//! and counted in the sync summary. What does propagate are transactional
//! commit failures from the store, which the caller may retry.

use thiserror::Error;

/// Errors produced by a reconciliation pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A batched commit or deletion failed; the transaction was rolled
    /// back and the pass aborted.
    #[error("store error: {0}")]
    Store(#[from] galleon_storage::StoreError),
}
