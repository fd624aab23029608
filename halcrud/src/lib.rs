//! Main halcrud crate providing a generic CRUD resource mapper for document
//! databases.
//!
//! This crate is the primary entry point for users of the halcrud framework.
//! It re-exports the core types and functionality from various sub-crates and
//! provides convenient access to different storage backends.
//!
//! # Features
//!
//! - **Schema-validated CRUD** - Declare a resource schema once; create and
//!   update inputs are validated against it and undeclared fields stripped
//! - **Soft deletion** - Deletions mark documents instead of erasing them,
//!   with visibility rules on reads and a separate hard-delete escape hatch
//! - **HAL hypermedia output** - Items and collections serialize with
//!   `_links` and `_embedded` sections, including pagination links
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use halcrud::{prelude::*, memory::MemoryStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = ResourceSchema::new(json!({
//!         "type": "object",
//!         "properties": {
//!             "name": { "type": "string" },
//!             "email": { "type": "string" }
//!         },
//!         "required": ["name"]
//!     }))?;
//!
//!     let mapper = ResourceMapper::builder(MemoryStore::new(), "users", schema)
//!         .detail_route("user-detail")
//!         .list_route("user-list")
//!         .build();
//!
//!     // Create a document; timestamps and identity are assigned.
//!     let stored = mapper.create(json!({ "name": "Alice" })).await?;
//!
//!     // List the first page with a total count.
//!     let page = mapper.list(&Default::default(), true).await?;
//!     println!("{} of {:?} users", page.items.len(), page.total_items);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use halcrud_core::{backend, document, error, filter, hal, mapper, page, query, schema};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use halcrud_memory::{MemoryStore, MemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use halcrud_mongodb::{MongoStore, MongoStoreBuilder};
}
