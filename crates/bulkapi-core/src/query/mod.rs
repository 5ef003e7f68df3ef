//! Query translation layer
//!
//! Field-spec normalization, filter trees, compilation to wire parameters
//! and materialization of responses.

/// Query compiler
#[allow(missing_docs)]
pub mod compiler;
/// Field specification normalizer
#[allow(missing_docs)]
pub mod fields;
/// Filter expression tree
#[allow(missing_docs)]
pub mod filter;
/// Field lookups and operators
#[allow(missing_docs)]
pub mod lookup;
/// Mapping and structured-text filter forms
pub mod mapping;
/// Result materializer
#[allow(missing_docs)]
pub mod materialize;
/// Per-call query options
#[allow(missing_docs)]
pub mod options;

// Re-export main types
pub use compiler::{compile, compile_filter, Compiler, QueryParams, RESERVED_PARAMS};
pub use fields::{FieldEntry, FieldSpec};
pub use filter::{FilterNode, Q};
pub use lookup::{FieldLookup, FieldPath, LookupOperator, GROUP_KEYWORDS, JOIN};
pub use materialize::{
    materialize, stored_file_name, Materializer, Page, ResultTable, RowRef, DOWNLOAD_SEGMENT,
};
pub use options::{OrderBy, QueryOptions, MAX_PAGE_SIZE};
