//! Error types and result types for resource mapper operations.
//!
//! This module provides error handling for all mapper and store operations.
//! Use [`MapperResult<T>`] as the return type for fallible operations.
//!
//! Note that "not found" is never an error: lookup-style operations return
//! `Option<T>` and leave `None` for the HTTP layer to map to a 404-equivalent.

use bson::error::Error as BsonError;
use serde::Serialize;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// A single structured schema violation.
///
/// Mirrors the descriptor shape of common JSON-schema validators so the HTTP
/// layer can surface the exact set of invalid fields and reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Instance path of the offending field (e.g. `/name`), empty for the root.
    pub path: String,
    /// The schema keyword that failed (e.g. `required`, `type`).
    pub keyword: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    pub fn new(
        path: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            keyword: keyword.into(),
            message: message.into(),
        }
    }
}

/// Represents all possible errors that can occur in the resource mapper and
/// its store backends.
#[derive(Error, Debug)]
pub enum MapperError {
    /// Input failed schema validation. Carries the full list of violations,
    /// not just the first one.
    #[error("Validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),
    /// A uniqueness constraint was violated. Raised only by store adapters
    /// translating unique-index errors; the core mapper never produces this.
    #[error("Duplicate document: {0}")]
    Duplication(String),
    /// The resource schema itself is malformed.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Serialization/deserialization error when converting between document
    /// formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error occurred in the underlying storage backend. Backend faults
    /// propagate to the caller untouched: no retry, no wrapping.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for resource mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

impl From<BsonError> for MapperError {
    fn from(err: BsonError) -> Self {
        MapperError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for MapperError {
    fn from(err: SerdeJsonError) -> Self {
        MapperError::Serialization(err.to_string())
    }
}
