//! Filter translation from the mapper's AST to MongoDB query syntax.
//!
//! This module translates the mapper's abstract filter expressions into
//! MongoDB BSON documents for execution by the MongoDB query engine. Field
//! names pass through untrusted request parameters, so the translator rejects
//! names that could be interpreted as operators or paths.

use bson::{Bson, Document, doc};

use halcrud_core::{
    error::MapperError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Translates filter expressions into MongoDB query documents.
///
/// This struct implements the [`QueryVisitor`] trait to convert abstract
/// filter expressions into MongoDB's native BSON query syntax.
pub(crate) struct MongoFilterTranslator;

/// Rejects field names MongoDB would interpret as something other than a
/// top-level field: operator names (leading `$`), dotted paths and embedded
/// NUL bytes.
fn checked_field(field: &str) -> Result<&str, MapperError> {
    if field.is_empty()
        || field.starts_with('$')
        || field.contains('.')
        || field.contains('\0')
    {
        return Err(MapperError::Backend(format!(
            "invalid field name in filter: {field:?}"
        )));
    }

    Ok(field)
}

impl QueryVisitor for MongoFilterTranslator {
    type Output = Document;
    type Error = MapperError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        let field = checked_field(field)?;

        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field = checked_field(field)?;

        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
            }
        })
    }
}
