//! In-memory storage implementation for the resource mapper.
//!
//! This module provides a simple but complete in-memory backend that stores
//! documents in HashMaps behind async-safe read-write locks.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use mea::rwlock::RwLock;

use halcrud_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{DocumentId, render_id},
    error::{MapperError, MapperResult},
    query::{Expr, Query, SortDirection},
};

use crate::evaluator::{Comparable, DocumentEvaluator};

type CollectionMap = HashMap<String, Document>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait to provide a fully
/// functional document store that operates entirely in memory using
/// async-aware read-write locks. Documents are indexed by the canonical
/// string rendering of their `_id`.
///
/// # Thread Safety
///
/// `MemoryStore` is cloneable and uses an `Arc`-wrapped internal state,
/// allowing it to be safely shared across async tasks. Multiple clones of the
/// same instance share the same underlying data.
///
/// # Performance
///
/// Queries scan all documents in a collection (no indexing). For small to
/// medium datasets this is typically acceptable. For larger datasets,
/// consider a persistent backend like MongoDB.
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    /// The main storage map: collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing a `MemoryStore`.
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn find(&self, query: Query, collection: &str) -> MapperResult<Vec<Document>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut documents = collection_map
            .values()
            .filter(|doc| match &query.filter {
                Some(filter) => DocumentEvaluator::matches(doc, filter),
                None => true,
            })
            .cloned()
            .collect::<Vec<_>>();

        if let Some(sort) = &query.sort {
            documents.sort_by(|a, b| {
                // Missing fields sort as null.
                let left = a
                    .get(&sort.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);
                let right = b
                    .get(&sort.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);

                match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
                }
            });
        }

        let mut documents = documents
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect::<Vec<_>>();

        if !query.projection.is_empty() {
            for doc in &mut documents {
                let mut projected = Document::new();
                for (name, value) in doc.iter() {
                    // Identity always survives projection.
                    if name == "_id" || query.projection.iter().any(|field| field == name) {
                        projected.insert(name.clone(), value.clone());
                    }
                }
                *doc = projected;
            }
        }

        Ok(documents)
    }

    async fn count(&self, filter: Option<Expr>, collection: &str) -> MapperResult<u64> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(0),
        };

        let count = collection_map
            .values()
            .filter(|doc| match &filter {
                Some(filter) => DocumentEvaluator::matches(doc, filter),
                None => true,
            })
            .count();

        Ok(count as u64)
    }

    async fn find_one(&self, filter: Expr, collection: &str) -> MapperResult<Option<Document>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(None),
        };

        Ok(
            collection_map
                .values()
                .find(|doc| DocumentEvaluator::matches(doc, &filter))
                .cloned()
        )
    }

    async fn insert_one(&self, document: Document, collection: &str) -> MapperResult<()> {
        let key = document
            .get("_id")
            .map(render_id)
            .ok_or_else(|| MapperError::Backend("document is missing an identity".to_string()))?;

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if collection_map.contains_key(&key) {
            return Err(MapperError::Duplication(key));
        }

        collection_map.insert(key, document);
        Ok(())
    }

    async fn update_one(
        &self,
        id: &DocumentId,
        set: Document,
        collection: &str,
    ) -> MapperResult<()> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(()),
        };

        // A missing target is a silent no-op; updates never upsert.
        if let Some(document) = collection_map.get_mut(&id.to_string()) {
            for (name, value) in set {
                document.insert(name, value);
            }
        }

        Ok(())
    }

    async fn delete_one(&self, id: &DocumentId, collection: &str) -> MapperResult<()> {
        let mut store = self.store.write().await;

        if let Some(collection_map) = store.get_mut(collection) {
            collection_map.remove(&id.to_string());
        }

        Ok(())
    }
}

/// Builder for constructing [`MemoryStore`] instances.
///
/// Currently a no-op builder, but can be extended in future versions to
/// support configuration options like capacity hints.
#[derive(Default)]
pub struct MemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for MemoryStoreBuilder {
    type Backend = MemoryStore;

    /// Builds and returns a new [`MemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> MapperResult<Self::Backend> {
        Ok(MemoryStore::new())
    }
}
