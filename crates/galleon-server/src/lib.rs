//! HTTP/JSON API server for the galleon media index.
//!
//! Exposes the paginated query surface, the sampler-metadata inspection
//! and aggregate endpoints, sync triggers (blocking full sync and an SSE
//! folder sync), and the CRUD mutation surface (favorite/rename/move/
//! delete). This crate contains the server framework, state wiring, error
//! handling, and route definitions; all index semantics live in the
//! storage and sync crates.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
