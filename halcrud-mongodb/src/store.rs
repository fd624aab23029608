use async_trait::async_trait;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};

use halcrud_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::DocumentId,
    error::{MapperError, MapperResult},
    query::{Expr, Query, QueryVisitor, SortDirection},
};

use crate::query::MongoFilterTranslator;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug)]
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoStoreBuilder {
        MongoStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn translate_filter(filter: Option<&Expr>) -> MapperResult<Document> {
        match filter {
            Some(expr) => MongoFilterTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }

    /// Gracefully shuts down the underlying driver connection pool.
    pub async fn shutdown(self) -> MapperResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoStore {
    async fn find(&self, query: Query, collection: &str) -> MapperResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.skip {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            });
        }
        if !query.projection.is_empty() {
            // `_id` is included by default; the mapper relies on that.
            options.projection = Some(Document::from_iter(
                query
                    .projection
                    .iter()
                    .map(|field| (field.clone(), bson::Bson::Int32(1))),
            ));
        }

        Ok(
            self.get_collection(collection)
                .find(Self::translate_filter(query.filter.as_ref())?)
                .with_options(options)
                .await
                .map_err(|e| MapperError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| MapperError::Backend(e.to_string()))?
        )
    }

    async fn count(&self, filter: Option<Expr>, collection: &str) -> MapperResult<u64> {
        self.get_collection(collection)
            .count_documents(Self::translate_filter(filter.as_ref())?)
            .await
            .map_err(|e| MapperError::Backend(e.to_string()))
    }

    async fn find_one(&self, filter: Expr, collection: &str) -> MapperResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(MongoFilterTranslator.visit_expr(&filter)?)
            .await
            .map_err(|e| MapperError::Backend(e.to_string()))
    }

    async fn insert_one(&self, document: Document, collection: &str) -> MapperResult<()> {
        let key = document
            .get("_id")
            .map(halcrud_core::document::render_id)
            .unwrap_or_default();

        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| translate_write_error(e, &key))?;

        Ok(())
    }

    async fn update_one(
        &self,
        id: &DocumentId,
        set: Document,
        collection: &str,
    ) -> MapperResult<()> {
        self.get_collection(collection)
            .update_one(
                doc! { "_id": id },
                doc! { "$set": set },
            )
            .await
            .map_err(|e| MapperError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn delete_one(&self, id: &DocumentId, collection: &str) -> MapperResult<()> {
        self.get_collection(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| MapperError::Backend(e.to_string()))?;

        Ok(())
    }
}

/// Maps a driver write error to a mapper error, surfacing unique index
/// violations as duplication.
fn translate_write_error(error: mongodb::error::Error, key: &str) -> MapperError {
    use mongodb::error::{ErrorKind, WriteFailure};

    match &*error.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            MapperError::Duplication(key.to_string())
        }
        _ => MapperError::Backend(error.to_string()),
    }
}

pub struct MongoStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoStoreBuilder {
    type Backend = MongoStore;

    async fn build(self) -> MapperResult<Self::Backend> {
        let client = Client::with_options(
            ClientOptions::parse(&self.dsn)
                .await
                .map_err(|e| MapperError::Initialization(e.to_string()))?,
        )
        .map_err(|e| MapperError::Initialization(e.to_string()))?;

        tracing::info!(database = %self.database, "database connection established");

        Ok(MongoStore::new(client, self.database))
    }
}
