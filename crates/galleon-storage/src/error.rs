//! Storage error types for galleon-storage.
//!
//! [`StoreError`] covers all anticipated failure modes in the index layer.
//! Transactional failures (batch commits, migrations) always bubble to the
//! caller; lookup misses get their own matchable variant.

use thiserror::Error;

/// Errors produced by index-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An underlying SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed; the migration transaction has
    /// been rolled back and the pre-migration tables are intact.
    #[error("migration error: {0}")]
    Migration(String),

    /// A file record with the given id was not found.
    #[error("file not found: {0}")]
    FileNotFound(String),
}
