//! Document identity and external/storage representations.
//!
//! Documents are stored as BSON with a UUID `_id` (the store's native
//! identity type) and exposed externally as JSON objects with a stable string
//! `id` field. [`DocumentId`] is the single typed identity value with one
//! canonical string rendering; the internal field name never leaks into
//! external representations.
//!
//! Soft-deletion bookkeeping lives in the reserved `deleted`, `deletedAt` and
//! `deletedBy` fields; [`to_external`] strips them whenever the document is
//! not deleted (absent or `false`), so they only ever appear on documents
//! that are actually soft-deleted.

use std::fmt;
use std::str::FromStr;

use bson::{Bson, Document, Uuid};
use serde_json::{Map, Number, Value};

use crate::error::{MapperError, MapperResult};

/// Reserved soft-deletion marker fields.
pub const DELETION_FIELDS: [&str; 3] = ["deleted", "deletedAt", "deletedBy"];

/// Typed document identity backed by the store's native UUID identity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new())
    }

    /// Returns the underlying UUID value.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    /// The canonical string rendering used in external `id` fields and
    /// hypermedia URLs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| MapperError::Serialization(format!("invalid document id '{s}': {e}")))
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// References convert through the library's blanket From<&T> impl; only the
// owned conversion is defined here.
impl From<DocumentId> for Bson {
    fn from(id: DocumentId) -> Self {
        id.0.into()
    }
}

/// Projects a stored document to its external JSON representation.
///
/// The internal `_id` becomes the leading `id` field in canonical string
/// form. Unless the document is soft-deleted (`deleted == true`), the
/// deletion marker fields are stripped entirely.
pub fn to_external(document: &Document) -> Value {
    let mut json = Map::new();

    if let Some(id) = document.get("_id") {
        json.insert("id".to_string(), Value::String(render_id(id)));
    }

    for (name, value) in document {
        if name == "_id" {
            continue;
        }
        json.insert(name.clone(), bson_to_json(value));
    }

    if !matches!(document.get("deleted"), Some(Bson::Boolean(true))) {
        for field in DELETION_FIELDS {
            json.remove(field);
        }
    }

    Value::Object(json)
}

/// Converts a validated external JSON object into its storage representation.
///
/// The inverse of [`to_external`] for write paths: a caller-supplied `id`
/// field parses into the internal `_id`; all other fields convert
/// structurally to BSON.
///
/// # Errors
///
/// Returns [`MapperError::Serialization`] when `id` is present but is not a
/// valid identity string.
pub fn to_storage(mut input: Map<String, Value>) -> MapperResult<Document> {
    let mut document = Document::new();

    if let Some(id) = input.remove("id") {
        let id = id
            .as_str()
            .ok_or_else(|| MapperError::Serialization("document id must be a string".into()))?
            .parse::<DocumentId>()?;

        document.insert("_id", &id);
    }

    for (name, value) in input {
        document.insert(name, json_to_bson(value));
    }

    Ok(document)
}

/// Renders an identity BSON value in canonical string form.
pub fn render_id(id: &Bson) -> String {
    match id {
        Bson::Binary(binary) => match binary.to_uuid() {
            Ok(uuid) => uuid.to_string(),
            Err(_) => id.to_string(),
        },
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Structural JSON to BSON conversion.
pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                Bson::Int64(int)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(k, v)| (k, json_to_bson(v)))
                .collect(),
        ),
    }
}

/// Structural BSON to JSON conversion. Timestamps render as RFC 3339 strings
/// and UUIDs in canonical string form.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::Number((*i as i64).into()),
        Bson::Int64(i) => Value::Number((*i).into()),
        Bson::Double(d) => Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::DateTime(dt) => Value::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.to_string()),
        ),
        Bson::Binary(_) => Value::String(render_id(value)),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => Value::Object(
            doc.iter()
                .map(|(k, v)| (k.clone(), bson_to_json(v)))
                .collect(),
        ),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn identity_round_trips_through_canonical_string() {
        let id = DocumentId::new();
        let parsed = id.to_string().parse::<DocumentId>().unwrap();

        assert_eq!(id, parsed);
    }

    #[test]
    fn identity_converts_to_bson_by_value_and_reference() {
        let id = DocumentId::new();

        assert_eq!(Bson::from(&id), Bson::from(id));
    }

    #[test]
    fn invalid_identity_string_is_rejected() {
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn external_representation_renames_internal_identity() {
        let id = DocumentId::new();
        let document = doc! { "_id": &id, "name": "alice" };

        let json = to_external(&document);

        assert_eq!(json["id"], json!(id.to_string()));
        assert_eq!(json["name"], json!("alice"));
        assert!(json.get("_id").is_none());
    }

    #[test]
    fn deletion_markers_are_stripped_when_not_deleted() {
        let id = DocumentId::new();

        for document in [
            doc! { "_id": &id, "name": "a", "deleted": false, "deletedAt": bson::DateTime::now() },
            doc! { "_id": &id, "name": "a" },
        ] {
            let json = to_external(&document);

            assert!(json.get("deleted").is_none());
            assert!(json.get("deletedAt").is_none());
            assert!(json.get("deletedBy").is_none());
        }
    }

    #[test]
    fn deletion_markers_survive_when_deleted() {
        let id = DocumentId::new();
        let document = doc! {
            "_id": &id,
            "deleted": true,
            "deletedAt": bson::DateTime::now(),
            "deletedBy": "user-1",
        };

        let json = to_external(&document);

        assert_eq!(json["deleted"], json!(true));
        assert!(json.get("deletedAt").is_some());
        assert_eq!(json["deletedBy"], json!("user-1"));
    }

    #[test]
    fn storage_representation_maps_external_id_to_internal() {
        let id = DocumentId::new();
        let input = json!({ "id": id.to_string(), "name": "alice" });

        let document = to_storage(input.as_object().cloned().unwrap()).unwrap();

        assert_eq!(document.get("_id"), Some(&Bson::from(&id)));
        assert!(document.get("id").is_none());
        assert_eq!(document.get_str("name").ok(), Some("alice"));
    }

    #[test]
    fn storage_representation_rejects_malformed_id() {
        let input = json!({ "id": "nope" }).as_object().cloned().unwrap();

        assert!(matches!(to_storage(input), Err(MapperError::Serialization(_))));
    }
}
