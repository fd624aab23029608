//! Translation of flat request query parameters into filter expressions.
//!
//! This module converts the string parameter mapping of a list request into
//! the [`Expr`](crate::query::Expr) AST. Translation is driven by a set of
//! [`FilterRules`]: a blacklist of reserved parameter names that control
//! pagination and output shape instead of filtering, and a table of custom
//! operators mapped onto a target field.
//!
//! # Parameter grammar
//!
//! - `name=value` becomes an equality clause.
//! - A value prefix of `!` negates; `>`, `>=`, `<`, `<=` select the
//!   corresponding comparison operator.
//! - Custom operators: `between=a|b` expands to a closed range on the target
//!   field, `after=x` to greater-than, `before=x` to less-than.
//! - Values are coerced: `true`/`false` to booleans, integers and floats to
//!   numbers, RFC 3339 timestamps to datetimes, everything else to strings.

use std::collections::{BTreeMap, BTreeSet};

use bson::Bson;
use chrono::{DateTime, Utc};

use crate::query::{Expr, Filter};

/// Rules driving query-parameter-to-filter translation.
///
/// # Example
///
/// ```ignore
/// use halcrud_core::filter::FilterRules;
///
/// let rules = FilterRules::new()
///     .custom_operator("after", "updatedAt")
///     .blacklist("page");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    custom: BTreeMap<String, String>,
    blacklist: BTreeSet<String>,
}

impl FilterRules {
    /// Creates an empty rule set: every parameter becomes a filter clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a custom operator parameter name onto a target field.
    pub fn custom_operator(mut self, operator: impl Into<String>, field: impl Into<String>) -> Self {
        self.custom.insert(operator.into(), field.into());
        self
    }

    /// Excludes a parameter name from filter-expression generation.
    pub fn blacklist(mut self, name: impl Into<String>) -> Self {
        self.blacklist.insert(name.into());
        self
    }

    /// Translates a flat parameter mapping into a filter expression.
    ///
    /// Returns `None` when no parameter produced a clause (match all).
    /// Translation never fails: unparseable values fall back to string
    /// equality.
    pub fn translate(&self, params: &BTreeMap<String, String>) -> Option<Expr> {
        let mut clauses = Vec::new();

        for (name, raw) in params {
            if self.blacklist.contains(name.as_str()) {
                continue;
            }

            if let Some(field) = self.custom.get(name.as_str()) {
                clauses.push(Self::translate_custom(name, field, raw));
            } else {
                clauses.push(Self::translate_plain(name, raw));
            }
        }

        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Expr::And(clauses)),
        }
    }

    fn translate_custom(operator: &str, field: &str, raw: &str) -> Expr {
        match operator {
            "between" => match raw.split_once('|') {
                Some((low, high)) => Filter::gte(field, coerce(low)).and(Filter::lte(field, coerce(high))),
                // No separator: degrade to an equality match on the target field.
                None => Filter::eq(field, coerce(raw)),
            },
            "after" => Filter::gt(field, coerce(raw)),
            "before" => Filter::lt(field, coerce(raw)),
            _ => Filter::eq(field, coerce(raw)),
        }
    }

    fn translate_plain(field: &str, raw: &str) -> Expr {
        if let Some(rest) = raw.strip_prefix(">=") {
            Filter::gte(field, coerce(rest))
        } else if let Some(rest) = raw.strip_prefix("<=") {
            Filter::lte(field, coerce(rest))
        } else if let Some(rest) = raw.strip_prefix('>') {
            Filter::gt(field, coerce(rest))
        } else if let Some(rest) = raw.strip_prefix('<') {
            Filter::lt(field, coerce(rest))
        } else if let Some(rest) = raw.strip_prefix('!') {
            Filter::ne(field, coerce(rest))
        } else {
            Filter::eq(field, coerce(raw))
        }
    }
}

/// Coerces a raw parameter value into the closest BSON scalar.
fn coerce(raw: &str) -> Bson {
    match raw {
        "true" => return Bson::Boolean(true),
        "false" => return Bson::Boolean(false),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Bson::Int64(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Bson::Double(float);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Bson::DateTime(bson::DateTime::from_chrono(datetime.with_timezone(&Utc)));
    }

    Bson::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldOp;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn crud_rules() -> FilterRules {
        FilterRules::new()
            .custom_operator("between", "updatedAt")
            .custom_operator("after", "updatedAt")
            .custom_operator("before", "updatedAt")
            .blacklist("fields")
            .blacklist("page")
            .blacklist("sort")
            .blacklist("order")
    }

    #[test]
    fn blacklisted_parameters_produce_no_clauses() {
        let expr = crud_rules().translate(&params(&[
            ("fields", "name,age"),
            ("page", "2"),
            ("sort", "name"),
            ("order", "asc"),
        ]));

        assert!(expr.is_none());
    }

    #[test]
    fn plain_parameter_becomes_equality() {
        let expr = crud_rules()
            .translate(&params(&[("name", "alice")]))
            .unwrap();

        match expr {
            Expr::Field { field, op: FieldOp::Eq, value } => {
                assert_eq!(field, "name");
                assert_eq!(value, Bson::String("alice".into()));
            }
            other => panic!("unexpected expression: {other:?}"),
        }
    }

    #[test]
    fn multiple_parameters_combine_with_and() {
        let expr = crud_rules()
            .translate(&params(&[("name", "alice"), ("age", "30")]))
            .unwrap();

        match expr {
            Expr::And(clauses) => assert_eq!(clauses.len(), 2),
            other => panic!("unexpected expression: {other:?}"),
        }
    }

    #[test]
    fn comparison_prefixes_select_operators() {
        for (raw, expected) in [
            (">5", FieldOp::Gt),
            (">=5", FieldOp::Gte),
            ("<5", FieldOp::Lt),
            ("<=5", FieldOp::Lte),
            ("!5", FieldOp::Ne),
        ] {
            let expr = crud_rules()
                .translate(&params(&[("age", raw)]))
                .unwrap();

            match expr {
                Expr::Field { op, value, .. } => {
                    assert_eq!(
                        std::mem::discriminant(&op),
                        std::mem::discriminant(&expected)
                    );
                    assert_eq!(value, Bson::Int64(5));
                }
                other => panic!("unexpected expression: {other:?}"),
            }
        }
    }

    #[test]
    fn between_expands_to_closed_range_on_target_field() {
        let expr = crud_rules()
            .translate(&params(&[(
                "between",
                "2024-01-01T00:00:00Z|2024-02-01T00:00:00Z",
            )]))
            .unwrap();

        match expr {
            Expr::And(clauses) => {
                assert_eq!(clauses.len(), 2);
                for clause in &clauses {
                    match clause {
                        Expr::Field { field, value, .. } => {
                            assert_eq!(field, "updatedAt");
                            assert!(matches!(value, Bson::DateTime(_)));
                        }
                        other => panic!("unexpected clause: {other:?}"),
                    }
                }
            }
            other => panic!("unexpected expression: {other:?}"),
        }
    }

    #[test]
    fn after_and_before_map_to_target_field_bounds() {
        let expr = crud_rules()
            .translate(&params(&[("after", "2024-01-01T00:00:00Z")]))
            .unwrap();

        match expr {
            Expr::Field { field, op: FieldOp::Gt, .. } => assert_eq!(field, "updatedAt"),
            other => panic!("unexpected expression: {other:?}"),
        }
    }

    #[test]
    fn values_are_coerced_to_scalars() {
        assert_eq!(coerce("true"), Bson::Boolean(true));
        assert_eq!(coerce("42"), Bson::Int64(42));
        assert_eq!(coerce("4.5"), Bson::Double(4.5));
        assert!(matches!(coerce("2024-06-01T12:00:00Z"), Bson::DateTime(_)));
        assert_eq!(coerce("plain"), Bson::String("plain".into()));
    }
}
