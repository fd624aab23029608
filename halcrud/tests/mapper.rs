//! End-to-end mapper behavior against the in-memory backend.

use std::collections::BTreeMap;

use halcrud::{memory::MemoryStore, prelude::*};
use serde_json::{Value, json};

fn user_schema() -> ResourceSchema {
    ResourceSchema::new(json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "email": { "type": "string" },
            "age": { "type": "integer" }
        },
        "required": ["name"]
    }))
    .unwrap()
}

fn user_mapper() -> ResourceMapper<MemoryStore> {
    ResourceMapper::builder(MemoryStore::new(), "users", user_schema())
        .detail_route("user-detail")
        .list_route("user-list")
        .build()
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn stored_id(document: &bson::Document) -> DocumentId {
    halcrud::document::render_id(document.get("_id").unwrap())
        .parse()
        .unwrap()
}

struct PathRouter;

impl UrlBuilder for PathRouter {
    fn url(&self, route: &str, params: &[&str]) -> String {
        let mut url = format!("/{route}");
        for param in params {
            url.push('/');
            url.push_str(param);
        }
        url
    }
}

struct ListContext {
    router: PathRouter,
    query: BTreeMap<String, String>,
}

impl RequestContext for ListContext {
    fn router(&self) -> &dyn UrlBuilder {
        &self.router
    }
    fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }
}

#[tokio::test]
async fn create_assigns_identity_and_equal_timestamps() {
    let mapper = user_mapper();

    let stored = mapper.create(json!({ "name": "alice" })).await.unwrap();

    assert!(stored.get("_id").is_some());
    let created = stored.get_datetime("createdAt").unwrap();
    let updated = stored.get_datetime("updatedAt").unwrap();
    assert_eq!(created, updated);

    let id = stored_id(&stored);
    let fetched = mapper.detail(&id, false).await.unwrap().unwrap();
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn create_strips_undeclared_fields() {
    let mapper = user_mapper();

    let stored = mapper
        .create(json!({ "name": "alice", "role": "admin" }))
        .await
        .unwrap();

    assert!(stored.get("role").is_none());
    assert_eq!(stored.get_str("name").ok(), Some("alice"));
}

#[tokio::test]
async fn create_reports_every_violation() {
    let mapper = user_mapper();

    let result = mapper.create(json!({ "email": 5, "age": "old" })).await;

    match result {
        Err(MapperError::Validation(violations)) => {
            // Missing required name plus two type mismatches.
            assert_eq!(violations.len(), 3);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn list_pages_are_capped_and_counted() {
    let mapper = user_mapper();
    for i in 0..30 {
        mapper
            .create(json!({ "name": format!("user-{i}") }))
            .await
            .unwrap();
    }

    let first = mapper.list(&params(&[]), false).await.unwrap();
    assert_eq!(first.items.len(), 25);
    assert_eq!(first.page, 1);
    assert_eq!(first.total_items, None);

    let second = mapper
        .list(&params(&[("page", "2")]), true)
        .await
        .unwrap();
    assert_eq!(second.items.len(), 5);
    assert_eq!(second.total_items, Some(30));
    // The divisor is the short page's own length, not the page size.
    assert_eq!(second.page_count, Some(6));
}

#[tokio::test]
async fn list_filters_and_projects() {
    let mapper = user_mapper();
    mapper
        .create(json!({ "name": "alice", "email": "a@example.com", "age": 30 }))
        .await
        .unwrap();
    mapper
        .create(json!({ "name": "bob", "email": "b@example.com", "age": 40 }))
        .await
        .unwrap();

    let filtered = mapper
        .list(&params(&[("name", "alice")]), true)
        .await
        .unwrap();
    assert_eq!(filtered.items.len(), 1);
    assert_eq!(filtered.total_items, Some(1));
    assert_eq!(filtered.items[0].get_str("name").ok(), Some("alice"));

    let ranged = mapper
        .list(&params(&[("age", ">=35")]), false)
        .await
        .unwrap();
    assert_eq!(ranged.items.len(), 1);
    assert_eq!(ranged.items[0].get_str("name").ok(), Some("bob"));

    let projected = mapper
        .list(&params(&[("fields", "name")]), false)
        .await
        .unwrap();
    for item in &projected.items {
        assert!(item.get("_id").is_some());
        assert!(item.get("name").is_some());
        assert!(item.get("email").is_none());
    }
}

#[tokio::test]
async fn update_merges_validated_fields() {
    let mapper = user_mapper();
    let stored = mapper
        .create(json!({ "name": "alice", "age": 30 }))
        .await
        .unwrap();
    let id = stored_id(&stored);

    let updated = mapper
        .update(&id, json!({ "age": 31 }), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.get_i64("age").ok(), Some(31));
    assert_eq!(updated.get_str("name").ok(), Some("alice"));

    let fetched = mapper.detail(&id, false).await.unwrap().unwrap();
    assert_eq!(fetched.get_i64("age").ok(), Some(31));

    // Required fields are not enforced on partial input, so omitting name is
    // fine; supplying a wrong type still fails.
    assert!(matches!(
        mapper.update(&id, json!({ "age": "old" }), false).await,
        Err(MapperError::Validation(_))
    ));
}

#[tokio::test]
async fn update_cannot_rewrite_identity() {
    let schema = ResourceSchema::new(json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "name": { "type": "string" }
        },
        "required": ["name"]
    }))
    .unwrap();
    let mapper = ResourceMapper::builder(MemoryStore::new(), "users", schema).build();

    let stored = mapper.create(json!({ "name": "alice" })).await.unwrap();
    let id = stored_id(&stored);

    let other = DocumentId::new().to_string();
    let updated = mapper
        .update(&id, json!({ "id": other, "name": "bob" }), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stored_id(&updated), id);

    let fetched = mapper.detail(&id, false).await.unwrap().unwrap();
    assert_eq!(fetched.get_str("name").ok(), Some("bob"));
    assert_eq!(stored_id(&fetched), id);
}

#[tokio::test]
async fn absurd_page_numbers_yield_an_empty_page() {
    let mapper = user_mapper();
    mapper.create(json!({ "name": "alice" })).await.unwrap();

    let listing = mapper
        .list(&params(&[("page", "1000000000000000000")]), true)
        .await
        .unwrap();

    assert!(listing.items.is_empty());
    assert_eq!(listing.page, 1_000_000_000_000_000_000);
    assert_eq!(listing.total_items, Some(1));
    assert_eq!(listing.page_count, None);
}

#[tokio::test]
async fn missing_documents_are_sentinels_not_errors() {
    let mapper = user_mapper();
    let missing = DocumentId::new();

    assert!(mapper.detail(&missing, false).await.unwrap().is_none());
    assert!(
        mapper
            .update(&missing, json!({ "age": 1 }), false)
            .await
            .unwrap()
            .is_none()
    );
    assert!(mapper.delete(&missing, None).await.unwrap().is_none());
    assert!(mapper.remove(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn soft_delete_marks_and_hides() {
    let mapper = user_mapper();
    let stored = mapper.create(json!({ "name": "alice" })).await.unwrap();
    let id = stored_id(&stored);

    let deleted = mapper.delete(&id, Some("admin")).await.unwrap().unwrap();
    assert_eq!(deleted.get_bool("deleted").ok(), Some(true));
    assert!(deleted.get_datetime("deletedAt").is_ok());
    assert_eq!(deleted.get_str("deletedBy").ok(), Some("admin"));

    // Hidden from normal reads, reachable when opted in.
    assert!(mapper.detail(&id, false).await.unwrap().is_none());
    assert!(mapper.detail(&id, true).await.unwrap().is_some());

    // A second delete no longer sees the document.
    assert!(mapper.delete(&id, None).await.unwrap().is_none());
}

#[tokio::test]
async fn soft_delete_without_user_omits_deleted_by() {
    let mapper = user_mapper();
    let stored = mapper.create(json!({ "name": "alice" })).await.unwrap();
    let id = stored_id(&stored);

    let deleted = mapper.delete(&id, None).await.unwrap().unwrap();

    assert_eq!(deleted.get_bool("deleted").ok(), Some(true));
    assert!(deleted.get("deletedBy").is_none());
}

#[tokio::test]
async fn soft_deleted_documents_still_list() {
    let mapper = user_mapper();
    let stored = mapper.create(json!({ "name": "alice" })).await.unwrap();
    mapper.delete(&stored_id(&stored), None).await.unwrap();

    let listing = mapper.list(&params(&[]), false).await.unwrap();

    assert_eq!(listing.items.len(), 1);
}

#[tokio::test]
async fn remove_erases_even_soft_deleted_documents() {
    let mapper = user_mapper();
    let stored = mapper.create(json!({ "name": "alice" })).await.unwrap();
    let id = stored_id(&stored);

    mapper.delete(&id, None).await.unwrap();
    assert_eq!(mapper.remove(&id).await.unwrap(), Some(()));

    assert!(mapper.detail(&id, true).await.unwrap().is_none());
    assert!(mapper.remove(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_identity_surfaces_as_duplication() {
    let schema = ResourceSchema::new(json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "name": { "type": "string" }
        },
        "required": ["name"]
    }))
    .unwrap();
    let mapper = ResourceMapper::builder(MemoryStore::new(), "users", schema).build();

    let id = DocumentId::new().to_string();
    mapper
        .create(json!({ "id": id, "name": "alice" }))
        .await
        .unwrap();
    let second = mapper.create(json!({ "id": id, "name": "bob" })).await;

    assert!(matches!(second, Err(MapperError::Duplication(_))));
}

#[tokio::test]
async fn collection_hypermedia_embeds_and_links() {
    let mapper = user_mapper();
    for i in 0..30 {
        mapper
            .create(json!({ "name": format!("user-{i}") }))
            .await
            .unwrap();
    }

    let ctx = ListContext {
        router: PathRouter,
        query: params(&[("page", "2")]),
    };
    let listing = mapper.list(&ctx.query, true).await.unwrap();
    let out = mapper.to_hal_collection(&listing, &ctx).to_json();

    assert_eq!(out["_page"], json!(2));
    assert_eq!(out["_count"], json!(5));
    assert_eq!(out["_total_items"], json!(30));
    assert_eq!(out["_links"]["self"]["href"], json!("/user-list?page=2"));
    assert_eq!(out["_links"]["prev"]["href"], json!("/user-list?page=1"));
    assert_eq!(out["_links"]["next"]["href"], json!("/user-list?page=3"));
    assert!(out["_links"].get("first").is_none());

    let embedded = out["_embedded"]["users"].as_array().unwrap();
    assert_eq!(embedded.len(), 5);
    for item in embedded {
        let id = item["id"].as_str().unwrap();
        assert_eq!(
            item["_links"]["self"]["href"],
            Value::String(format!("/user-detail/{id}"))
        );
        assert!(item.get("_id").is_none());
    }
}
