//! Storage backend abstraction for the resource mapper.
//!
//! This module defines the document store contract the mapper consumes,
//! allowing it to work with different backends (in-memory, MongoDB, etc.).
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for the six
//! store operations the mapper needs: filtered find, count, single-document
//! lookup, insert, partial update and hard delete. Implementations are
//! required to be thread-safe (`Send + Sync`) and support concurrent access.
//!
//! Identity-based operations take a typed [`DocumentId`]; backends translate
//! it into their native `_id` filter. Backends do not interpret soft-delete
//! semantics; the mapper encodes visibility rules in the filters it passes
//! down.
//!
//! # Error Handling
//!
//! Operations return [`MapperResult<T>`](crate::error::MapperResult). Store
//! faults surface as [`MapperError::Backend`](crate::error::MapperError) and
//! propagate to the caller untouched; backends perform no retries.

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{document::DocumentId, error::MapperResult, query::{Expr, Query}};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from
/// multiple async tasks. The exact concurrency model is implementation
/// specific.
///
/// # Atomicity
///
/// Each method is a single store round-trip. Callers composing two calls
/// (read-then-write) get no transactional guarantee between them.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Queries documents in a collection.
    ///
    /// Applies the query's filter, projection, sort, skip and limit. When a
    /// projection is present, the returned documents always retain `_id`.
    async fn find(&self, query: Query, collection: &str) -> MapperResult<Vec<Document>>;

    /// Counts documents matching a filter. `None` matches all documents.
    async fn count(&self, filter: Option<Expr>, collection: &str) -> MapperResult<u64>;

    /// Retrieves the first document matching a filter, or `None`.
    async fn find_one(&self, filter: Expr, collection: &str) -> MapperResult<Option<Document>>;

    /// Inserts one document.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Duplication`](crate::error::MapperError) when
    /// the document's identity (or another unique index) is already taken.
    async fn insert_one(&self, document: Document, collection: &str) -> MapperResult<()>;

    /// Applies a partial `$set`-style update to the document with the given
    /// identity. Fields absent from `set` are retained. Never upserts: a
    /// missing target document is a silent no-op, matching the store
    /// acknowledgement semantics the mapper relies on.
    async fn update_one(
        &self,
        id: &DocumentId,
        set: Document,
        collection: &str,
    ) -> MapperResult<()>;

    /// Permanently deletes the document with the given identity, if present.
    async fn delete_one(&self, id: &DocumentId, collection: &str) -> MapperResult<()>;
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn find(&self, query: Query, collection: &str) -> MapperResult<Vec<Document>> {
        (*self).find(query, collection).await
    }

    async fn count(&self, filter: Option<Expr>, collection: &str) -> MapperResult<u64> {
        (*self).count(filter, collection).await
    }

    async fn find_one(&self, filter: Expr, collection: &str) -> MapperResult<Option<Document>> {
        (*self).find_one(filter, collection).await
    }

    async fn insert_one(&self, document: Document, collection: &str) -> MapperResult<()> {
        (*self)
            .insert_one(document, collection)
            .await
    }

    async fn update_one(
        &self,
        id: &DocumentId,
        set: Document,
        collection: &str,
    ) -> MapperResult<()> {
        (*self)
            .update_one(id, set, collection)
            .await
    }

    async fn delete_one(&self, id: &DocumentId, collection: &str) -> MapperResult<()> {
        (*self).delete_one(id, collection).await
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> MapperResult<Self::Backend>;
}
