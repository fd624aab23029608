//! In-memory storage backend for the halcrud resource mapper.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` trait. It uses async-aware read-write locks for concurrent
//! access and is ideal for development, testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full query support** - Filtering, projection, sorting and pagination
//! - **No external services** - Documents live in process memory
//!
//! # Quick Start
//!
//! ```ignore
//! use halcrud_core::mapper::ResourceMapper;
//! use halcrud_memory::MemoryStore;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = halcrud_core::schema::ResourceSchema::new(json!({
//!         "type": "object",
//!         "properties": { "name": { "type": "string" } },
//!         "required": ["name"]
//!     }))?;
//!
//!     let mapper = ResourceMapper::builder(MemoryStore::new(), "users", schema).build();
//!     mapper.create(json!({ "name": "Alice" })).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as halcrud_memory;

pub mod store;
pub mod evaluator;

pub use store::{MemoryStore, MemoryStoreBuilder};
