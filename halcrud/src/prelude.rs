//! Convenient re-exports of commonly used types from halcrud.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use halcrud::prelude::*;
//! ```
//!
//! This provides access to:
//! - The resource mapper and its builder
//! - Store backends and builders
//! - Query construction and filtering
//! - Schema validation and document identity types
//! - Hypermedia and pagination types
//! - Error types

pub use halcrud_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{DocumentId, DELETION_FIELDS},
    error::{MapperError, MapperResult, Violation},
    filter::FilterRules,
    hal::{HalResource, RequestContext, UrlBuilder},
    mapper::{ResourceMapper, ResourceMapperBuilder, DEFAULT_PAGE_SIZE},
    page::ListResult,
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    schema::{ResourceSchema, Validator},
};
