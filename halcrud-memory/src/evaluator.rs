//! Query expression evaluation for in-memory document filtering.
//!
//! This module provides the evaluation engine for filter expressions,
//! enabling filtering and comparison operations on BSON documents.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime};

use halcrud_core::{
    error::MapperError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Type-erased, comparable representation of BSON values.
///
/// This enum wraps BSON values and provides comparison operations for
/// filtering queries. It normalizes numeric types to f64 for easy comparison.
///
/// # Note
///
/// This is a private implementation detail used for query evaluation.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Raw binary value (UUID identities compare here)
    Bytes(&'a [u8]),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Binary(binary) => Comparable::Bytes(&binary.bytes),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Bytes(a), Comparable::Bytes(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::Bytes(a), Comparable::Bytes(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates a filter expression against one BSON document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<bool, MapperError> {
        self.visit_expr(expr)
    }

    /// Returns true when the document matches the expression; evaluation
    /// faults count as a non-match.
    pub fn matches(document: &Document, expr: &Expr) -> bool {
        DocumentEvaluator::new(document)
            .evaluate(expr)
            .unwrap_or(false)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = MapperError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(self.document.get(field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        match self.document.get(field) {
            Some(field_value) => match op {
                FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
                FieldOp::Ne => Ok(Comparable::from(field_value) != Comparable::from(value)),
                FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                    match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                        Some(ordering) => Ok(match op {
                            FieldOp::Gt => ordering == Ordering::Greater,
                            FieldOp::Gte => ordering == Ordering::Greater || ordering == Ordering::Equal,
                            FieldOp::Lt => ordering == Ordering::Less,
                            FieldOp::Lte => ordering == Ordering::Less || ordering == Ordering::Equal,
                            _ => unreachable!(),
                        }),
                        None => Ok(false),
                    }
                },
            },
            // Ne on an absent field matches, mirroring store semantics where a
            // missing field is "not equal" to any concrete value.
            None => Ok(matches!(op, FieldOp::Ne)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use halcrud_core::query::Filter;

    #[test]
    fn equality_matches_across_scalar_types() {
        let document = doc! { "name": "alice", "age": 30_i64, "active": true };

        assert!(DocumentEvaluator::matches(&document, &Filter::eq("name", "alice")));
        assert!(DocumentEvaluator::matches(&document, &Filter::eq("age", 30_i64)));
        assert!(DocumentEvaluator::matches(&document, &Filter::eq("active", true)));
        assert!(!DocumentEvaluator::matches(&document, &Filter::eq("name", "bob")));
    }

    #[test]
    fn integers_and_doubles_compare_as_numbers() {
        let document = doc! { "age": 30_i64 };

        assert!(DocumentEvaluator::matches(&document, &Filter::eq("age", 30.0)));
        assert!(DocumentEvaluator::matches(&document, &Filter::gt("age", 29.5)));
    }

    #[test]
    fn range_operators_order_datetimes() {
        let early = bson::DateTime::from_millis(1_000);
        let late = bson::DateTime::from_millis(2_000);
        let document = doc! { "updatedAt": late };

        assert!(DocumentEvaluator::matches(&document, &Filter::gt("updatedAt", early)));
        assert!(!DocumentEvaluator::matches(&document, &Filter::lte("updatedAt", early)));
    }

    #[test]
    fn not_equal_matches_when_field_is_absent() {
        let document = doc! { "name": "alice" };

        assert!(DocumentEvaluator::matches(&document, &Filter::ne("deleted", true)));
        assert!(!DocumentEvaluator::matches(&document, &Filter::eq("deleted", true)));
    }

    #[test]
    fn logical_connectives_combine() {
        let document = doc! { "name": "alice", "age": 30_i64 };

        let both = Filter::eq("name", "alice").and(Filter::gte("age", 18_i64));
        assert!(DocumentEvaluator::matches(&document, &both));

        let either = Filter::eq("name", "bob").or(Filter::eq("age", 30_i64));
        assert!(DocumentEvaluator::matches(&document, &either));

        let neither = Filter::eq("name", "bob").and(Filter::eq("age", 30_i64));
        assert!(!DocumentEvaluator::matches(&document, &neither));
    }

    #[test]
    fn existence_checks_both_polarities() {
        let document = doc! { "name": "alice" };

        assert!(DocumentEvaluator::matches(&document, &Filter::exists("name")));
        assert!(DocumentEvaluator::matches(&document, &Filter::not_exists("deleted")));
        assert!(!DocumentEvaluator::matches(&document, &Filter::exists("deleted")));
    }

    #[test]
    fn mismatched_types_never_order() {
        let document = doc! { "age": "thirty" };

        assert!(!DocumentEvaluator::matches(&document, &Filter::gt("age", 18_i64)));
        assert!(!DocumentEvaluator::matches(&document, &Filter::lt("age", 18_i64)));
    }
}
