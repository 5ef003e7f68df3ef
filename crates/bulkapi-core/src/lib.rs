//! # Bulk API Core
//!
//! Query translation layer for the bulk API client.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of the bulk API client.**
//!
//! Users should depend on the main `bulkapi` crate instead, which re-exports
//! everything needed and adds the model facade.
//!
//! ---
//!
//! Everything here is pure and synchronous: no I/O, no shared state. The
//! pipeline is
//!
//! ```text
//! mapping / builder / YAML ─┐
//!                           ├─> FilterNode ─┐
//! names / renames / YAML ───┴─> FieldSpec ──┴─> Compiler ─> QueryParams ─> (transport)
//!                                                                              │
//!                          ResultTable <── Materializer <── Page (JSON) <──────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod query;

pub use cache::{CacheKey, QueryCache};
pub use error::{Error, Result};
