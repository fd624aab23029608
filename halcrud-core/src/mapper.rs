//! The generic CRUD resource mapper.
//!
//! A [`ResourceMapper`] owns one logical collection of documents, a resource
//! schema describing valid document shape, and the route names used to build
//! hypermedia links. It translates REST-style list/detail/create/update/
//! delete operations into document store queries and serializes results into
//! HAL representations with pagination links.
//!
//! The mapper is stateless beyond its configuration: it performs at most two
//! sequential store round-trips per operation, never retries, and is safe to
//! share across concurrent callers. The read-then-write sequences of `update`
//! and `delete` are not transactional; a concurrent modification between the
//! two round-trips is an accepted limitation.
//!
//! # Example
//!
//! ```ignore
//! use halcrud::{prelude::*, memory::MemoryStore};
//! use serde_json::json;
//!
//! let schema = ResourceSchema::new(json!({
//!     "type": "object",
//!     "properties": { "name": { "type": "string" } },
//!     "required": ["name"]
//! }))?;
//!
//! let mapper = ResourceMapper::builder(MemoryStore::new(), "users", schema)
//!     .detail_route("user-detail")
//!     .list_route("user-list")
//!     .build();
//!
//! let stored = mapper.create(json!({ "name": "Alice" })).await?;
//! let fetched = mapper.detail(&stored_id, false).await?;
//! # Ok::<(), halcrud::error::MapperError>(())
//! ```

use std::collections::BTreeMap;

use bson::{Bson, Document};
use serde_json::{Map, Value, json};

use crate::{
    backend::StoreBackend,
    document::{self, DocumentId},
    error::MapperResult,
    filter::FilterRules,
    hal::{HalResource, RequestContext, UrlBuilder, to_query_string},
    page::ListResult,
    query::{Expr, Filter, Query, SortDirection},
    schema::{ResourceSchema, Validator},
};

/// Fixed number of documents per list page.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// A generic CRUD mapper for one resource type backed by one document store
/// collection.
///
/// # Type Parameters
///
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct ResourceMapper<B: StoreBackend> {
    backend: B,
    collection: String,
    detail_route: String,
    list_route: String,
    validator: Validator,
    rules: FilterRules,
    page_size: usize,
}

impl<B: StoreBackend> ResourceMapper<B> {
    /// Creates a builder for a mapper over the given backend, collection name
    /// and resource schema.
    ///
    /// The collection name doubles as the embed relation name in collection
    /// hypermedia output.
    pub fn builder(backend: B, collection: &str, schema: ResourceSchema) -> ResourceMapperBuilder<B> {
        ResourceMapperBuilder::new(backend, collection, schema)
    }

    /// Returns the collection name this mapper operates on.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Lists one page of documents matching the request parameters.
    ///
    /// Parameters are translated into a filter expression by the mapper's
    /// [`FilterRules`]; `fields` (comma-separated) becomes a projection,
    /// `page` selects the 1-based page (defaulting to 1 when absent or
    /// invalid). Results are sorted by creation time descending and capped at
    /// the page size. Soft-deleted documents are not filtered out of lists.
    ///
    /// When `with_count` is true an additional count query runs and the
    /// result carries `total_items` and the derived `page_count` (see
    /// [`ListResult::with_count`] for the page-count rule).
    pub async fn list(
        &self,
        params: &BTreeMap<String, String>,
        with_count: bool,
    ) -> MapperResult<ListResult> {
        let filter = self.rules.translate(params);

        let projection = params
            .get("fields")
            .map(|fields| {
                fields
                    .split(',')
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let page = params
            .get("page")
            .and_then(|page| page.parse::<u64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        // Page is caller-controlled; the offset must not overflow.
        let skip = usize::try_from((page - 1).saturating_mul(self.page_size as u64))
            .unwrap_or(usize::MAX);

        tracing::debug!(collection = %self.collection, page, with_count, "listing documents");

        let items = self
            .backend
            .find(
                Query::builder()
                    .filter_opt(filter.clone())
                    .projection(projection)
                    .skip(skip)
                    .limit(self.page_size)
                    .sort("createdAt", SortDirection::Desc)
                    .build(),
                &self.collection,
            )
            .await?;

        let result = ListResult::new(items, page);

        if with_count {
            let total = self
                .backend
                .count(filter, &self.collection)
                .await?;

            return Ok(result.with_count(total));
        }

        Ok(result)
    }

    /// Looks up one document by identity.
    ///
    /// Soft-deleted documents are excluded unless `with_deleted` is true.
    /// Returns `None` for not-found, never an error.
    pub async fn detail(
        &self,
        id: &DocumentId,
        with_deleted: bool,
    ) -> MapperResult<Option<Document>> {
        self.backend
            .find_one(self.identity_filter(id, with_deleted), &self.collection)
            .await
    }

    /// Validates and persists a new document.
    ///
    /// Input is validated against the full schema (required fields enforced,
    /// undeclared fields stripped). A caller-supplied `id` is honored when
    /// the schema declares it; otherwise a fresh identity is assigned.
    /// `createdAt` and `updatedAt` are stamped equal at creation time.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Validation`](crate::error::MapperError) with
    /// the full violation list on invalid input.
    pub async fn create(&self, input: Value) -> MapperResult<Document> {
        let sanitized = self.validate_all(input)?;
        let mut data = document::to_storage(sanitized)?;

        if !data.contains_key("_id") {
            data.insert("_id", DocumentId::new());
        }

        let now = bson::DateTime::now();
        data.insert("createdAt", now);
        data.insert("updatedAt", now);

        tracing::debug!(collection = %self.collection, "creating document");

        self.backend
            .insert_one(data.clone(), &self.collection)
            .await?;

        Ok(data)
    }

    /// Validates and merges a partial update into an existing document.
    ///
    /// The document is looked up first (respecting soft-delete visibility
    /// unless `with_deleted`); `None` means not-found and no mutation is
    /// attempted. Input is validated with `required` relaxed, merged into the
    /// in-memory document, and only the changed fields plus a refreshed
    /// `updatedAt` are persisted (no upsert). Identity is immutable: an `id`
    /// field in the input never reaches the persisted set. The returned
    /// merged view may differ from a literal post-persist read under
    /// concurrent writes.
    pub async fn update(
        &self,
        id: &DocumentId,
        input: Value,
        with_deleted: bool,
    ) -> MapperResult<Option<Document>> {
        let Some(mut entity) = self
            .backend
            .find_one(self.identity_filter(id, with_deleted), &self.collection)
            .await?
        else {
            return Ok(None);
        };

        let sanitized = self.validate(input, false)?;
        let mut data = document::to_storage(sanitized)?;
        // Identity is never a partial-update target, even when the schema
        // declares an id field.
        data.remove("_id");
        data.insert("updatedAt", bson::DateTime::now());

        for (name, value) in &data {
            entity.insert(name.clone(), value.clone());
        }

        self.backend
            .update_one(id, data, &self.collection)
            .await?;

        Ok(Some(entity))
    }

    /// Soft-deletes a document.
    ///
    /// Looks up an existing, not-already-deleted document; `None` means
    /// not-found. Sets `deleted=true` and `deletedAt=now`, plus `deletedBy`
    /// only when an acting user was supplied. Persists only those fields and
    /// returns the merged view.
    pub async fn delete(
        &self,
        id: &DocumentId,
        acting_user: Option<&str>,
    ) -> MapperResult<Option<Document>> {
        let Some(mut entity) = self
            .backend
            .find_one(self.identity_filter(id, false), &self.collection)
            .await?
        else {
            return Ok(None);
        };

        let mut data = Document::new();
        data.insert("deleted", true);
        data.insert("deletedAt", bson::DateTime::now());
        if let Some(user) = acting_user {
            data.insert("deletedBy", user);
        }

        tracing::debug!(collection = %self.collection, %id, "soft-deleting document");

        for (name, value) in &data {
            entity.insert(name.clone(), value.clone());
        }

        self.backend
            .update_one(id, data, &self.collection)
            .await?;

        Ok(Some(entity))
    }

    /// Permanently erases a document, regardless of soft-delete state.
    ///
    /// Returns `None` when the document does not exist (no delete issued).
    pub async fn remove(&self, id: &DocumentId) -> MapperResult<Option<()>> {
        let existing = self
            .backend
            .find_one(Filter::eq("_id", id), &self.collection)
            .await?;

        if existing.is_none() {
            return Ok(None);
        }

        tracing::debug!(collection = %self.collection, %id, "removing document");

        self.backend
            .delete_one(id, &self.collection)
            .await?;

        Ok(Some(()))
    }

    /// Projects a stored document to its external JSON representation.
    ///
    /// See [`document::to_external`].
    pub fn to_external(&self, stored: &Document) -> Value {
        document::to_external(stored)
    }

    /// Converts a validated external JSON object into its storage
    /// representation. See [`document::to_storage`].
    pub fn to_storage(&self, input: Map<String, Value>) -> MapperResult<Document> {
        document::to_storage(input)
    }

    /// Wraps a stored document as a hypermedia resource addressed at the
    /// detail route.
    ///
    /// For soft-deleted documents, `deletedAt`/`deletedBy` are carried into
    /// the output when present.
    pub fn to_hal(&self, stored: &Document, router: &dyn UrlBuilder) -> HalResource {
        let mut json = match document::to_external(stored) {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        if matches!(stored.get("deleted"), Some(Bson::Boolean(true))) {
            for field in ["deletedAt", "deletedBy"] {
                if let Some(value) = stored.get(field) {
                    json.insert(field.to_string(), document::bson_to_json(value));
                }
            }
        }

        let id = json
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        HalResource::new(Value::Object(json), router.url(&self.detail_route, &[&id]))
    }

    /// Builds the collection hypermedia resource for one list result.
    ///
    /// Items embed under the collection name; the payload carries `_page`
    /// and `_count`, plus `_total_items` and `_page_count` when a count was
    /// requested. Pagination links rewrite the request's `page` parameter:
    /// `first` when past page 2, `prev` when past page 1, `next` always
    /// (unbounded lookahead), and `last` only when the page count is known
    /// and more than one page ahead.
    pub fn to_hal_collection(&self, result: &ListResult, ctx: &dyn RequestContext) -> HalResource {
        let router = ctx.router();

        let entities = result
            .items
            .iter()
            .map(|item| self.to_hal(item, router))
            .collect::<Vec<_>>();

        let base = router.url(&self.list_route, &[]);
        let mut query = ctx.query().clone();

        let original = to_query_string(&query);
        let collection_url = if original.is_empty() {
            base.clone()
        } else {
            format!("{base}?{original}")
        };

        let mut payload = Map::new();
        payload.insert("_page".to_string(), json!(result.page));
        payload.insert("_count".to_string(), json!(entities.len()));
        if let Some(total) = result.total_items {
            payload.insert("_total_items".to_string(), json!(total));
        }
        if let Some(page_count) = result.page_count {
            payload.insert("_page_count".to_string(), json!(page_count));
        }

        let mut collection = HalResource::new(Value::Object(payload), collection_url);

        if result.page > 2 {
            query.insert("page".to_string(), "1".to_string());
            collection.link("first", format!("{base}?{}", to_query_string(&query)));
        }
        if result.page > 1 {
            query.insert("page".to_string(), (result.page - 1).to_string());
            collection.link("prev", format!("{base}?{}", to_query_string(&query)));
        }

        query.insert("page".to_string(), (result.page + 1).to_string());
        collection.link("next", format!("{base}?{}", to_query_string(&query)));

        if let Some(page_count) = result.page_count {
            if result.page + 1 < page_count {
                query.insert("page".to_string(), page_count.to_string());
                collection.link("last", format!("{base}?{}", to_query_string(&query)));
            }
        }

        collection.embed(self.collection.clone(), entities);
        collection
    }

    /// Validates a JSON object against the resource schema, stripping
    /// undeclared fields. `enforce_required` selects full (create) versus
    /// partial (update) validation.
    pub fn validate(&self, data: Value, enforce_required: bool) -> MapperResult<Map<String, Value>> {
        self.validator.validate(data, enforce_required)
    }

    /// Validates with required fields enforced (create semantics).
    pub fn validate_all(&self, data: Value) -> MapperResult<Map<String, Value>> {
        self.validate(data, true)
    }

    fn identity_filter(&self, id: &DocumentId, with_deleted: bool) -> Expr {
        let filter = Filter::eq("_id", id);

        if with_deleted {
            filter
        } else {
            filter.and(Filter::ne("deleted", true))
        }
    }
}

/// Builder for constructing [`ResourceMapper`] instances.
#[derive(Debug)]
pub struct ResourceMapperBuilder<B: StoreBackend> {
    backend: B,
    collection: String,
    schema: ResourceSchema,
    detail_route: Option<String>,
    list_route: Option<String>,
    rules: Option<FilterRules>,
    page_size: usize,
}

impl<B: StoreBackend> ResourceMapperBuilder<B> {
    fn new(backend: B, collection: &str, schema: ResourceSchema) -> Self {
        Self {
            backend,
            collection: collection.to_string(),
            schema,
            detail_route: None,
            list_route: None,
            rules: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the route name used for item self links.
    pub fn detail_route(mut self, route: impl Into<String>) -> Self {
        self.detail_route = Some(route.into());
        self
    }

    /// Sets the route name used for collection links.
    pub fn list_route(mut self, route: impl Into<String>) -> Self {
        self.list_route = Some(route.into());
        self
    }

    /// Overrides the default filter translation rules.
    pub fn filter_rules(mut self, rules: FilterRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Overrides the fixed page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Builds the mapper.
    ///
    /// Route names default to `<collection>.detail` / `<collection>.list`.
    /// The default filter rules blacklist `fields`, `page`, `sort` and
    /// `order`, and map the `between`/`after`/`before` operators onto
    /// `updatedAt`.
    pub fn build(self) -> ResourceMapper<B> {
        let rules = self.rules.unwrap_or_else(|| {
            FilterRules::new()
                .custom_operator("between", "updatedAt")
                .custom_operator("after", "updatedAt")
                .custom_operator("before", "updatedAt")
                .blacklist("fields")
                .blacklist("page")
                .blacklist("sort")
                .blacklist("order")
        });

        ResourceMapper {
            detail_route: self
                .detail_route
                .unwrap_or_else(|| format!("{}.detail", self.collection)),
            list_route: self
                .list_route
                .unwrap_or_else(|| format!("{}.list", self.collection)),
            backend: self.backend,
            collection: self.collection,
            validator: Validator::new(self.schema),
            rules,
            page_size: self.page_size,
        }
    }
}
