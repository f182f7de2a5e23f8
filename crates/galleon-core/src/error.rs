//! Core error types for galleon-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Parsing a
//! graph document is the only fallible construction in this crate; callers
//! treat a failure as "no metadata extractable", never as fatal.

use thiserror::Error;

/// Errors produced by the galleon-core crate.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The raw payload matched neither the linked nor the inline
    /// serialization shape.
    #[error("unrecognized graph serialization: {reason}")]
    UnrecognizedFormat { reason: String },
}
