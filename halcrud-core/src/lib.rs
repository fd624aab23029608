//! A generic CRUD resource mapper that translates REST-style list/detail/create/update/delete
//! operations into document store queries and HAL hypermedia representations.
//!
//! This crate is the core of the halcrud project and provides:
//!
//! - **Resource mapper** ([`mapper`]) - The central CRUD-to-document-store translation layer
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing document store backends
//! - **Query and filtering API** ([`query`]) - The filter expression AST consumed by backends
//! - **Query filter translation** ([`filter`]) - Request parameter to filter expression mapping
//! - **Schema validation** ([`schema`]) - JSON-schema based input validation and sanitization
//! - **Identity and projection helpers** ([`document`]) - External/storage document representations
//! - **Hypermedia serialization** ([`hal`]) - HAL resource and pagination link construction
//! - **List results** ([`page`]) - Page results with optional total/page counts
//! - **Error handling** ([`error`]) - Comprehensive error types and result types
//!
//! # Example
//!
//! ```ignore
//! use halcrud::{prelude::*, memory::MemoryStore};
//! use serde_json::json;
//!
//! let schema = ResourceSchema::new(json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer" }
//!     },
//!     "required": ["name"]
//! }))?;
//!
//! let mapper = ResourceMapper::builder(MemoryStore::new(), "users", schema)
//!     .detail_route("user-detail")
//!     .list_route("user-list")
//!     .build();
//!
//! let stored = mapper.create(json!({ "name": "Alice" })).await?;
//! # Ok::<(), halcrud::error::MapperError>(())
//! ```

#[allow(unused_extern_crates)]
extern crate self as halcrud_core;

pub mod backend;
pub mod document;
pub mod error;
pub mod filter;
pub mod hal;
pub mod mapper;
pub mod page;
pub mod query;
pub mod schema;
