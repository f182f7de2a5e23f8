//! Core graph-metadata model for galleon.
//!
//! This crate reconstructs generation parameters from the node graphs that
//! AI image/video tools embed in their output files. A graph arrives in one
//! of two serializations (a flat array of nodes with a separate link table,
//! or a map of node-id to node with inline connections); both are normalized
//! behind [`GraphDocument`] so the traversal and extraction layers never see
//! the difference.
//!
//! # Modules
//!
//! - [`doc`]: GraphDocument normalization over both wire formats
//! - [`trace`]: backward single-path traversal to resolve input sources
//! - [`tables`]: node-type constants and positional widget fallbacks
//! - [`extract`]: per-sampler field extraction
//! - [`metadata`]: payload detection entry point and debug sink
//! - [`value`]: literal-vs-connection variant and numeric coercions
//! - [`record`]: the extracted sampler record
//! - [`error`]: GraphError enum

pub mod doc;
pub mod error;
pub mod extract;
pub mod metadata;
pub mod record;
pub mod tables;
pub mod trace;
pub mod value;

// Re-export commonly used types
pub use doc::{GraphDocument, Node};
pub use error::GraphError;
pub use extract::SamplerExtractor;
pub use metadata::{DebugSink, DetectedFormat, MetadataService};
pub use record::SamplerRecord;
pub use trace::{GraphTracer, DEFAULT_MAX_HOPS};
pub use value::InputSource;
