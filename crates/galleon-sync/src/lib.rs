//! Disk/index reconciliation for galleon.
//!
//! [`SyncEngine`] diffs on-disk file state against the persisted index,
//! fans per-file analysis and metadata extraction out over a bounded worker
//! pool, and commits results in batched transactions. One malformed file
//! never prevents indexing of the rest; partial failures are summarized in
//! the returned [`SyncSummary`].
//!
//! # Modules
//!
//! - [`engine`]: the Scan/Diff/Dispatch/Collect/Commit/Publish state machine
//! - [`analyzer`]: per-file classification and cheap metadata probing
//! - [`source`]: raw embedded-metadata byte readers
//! - [`thumbs`]: the opaque thumbnail-producer seam
//! - [`cache`]: bounded, TTL'd, thread-safe cache for aggregate views
//! - [`config`]: extension sets and immutable worker configuration
//! - [`debug`]: filesystem debug sink for extraction stages
//! - [`error`]: SyncError enum

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod debug;
pub mod engine;
pub mod error;
pub mod source;
pub mod thumbs;

// Re-export commonly used types
pub use cache::{BoundedCache, CacheStats};
pub use config::{ExtensionSets, SyncConfig, WorkerContext};
pub use engine::{SyncEngine, SyncProgress, SyncSummary};
pub use error::SyncError;
pub use source::{EmbeddedMetadataScanner, MetadataSource};
pub use thumbs::{NullThumbnailer, ThumbnailProducer};
