//! List results and pagination metadata.
//!
//! This module provides the [`ListResult`] returned by the mapper's `list`
//! operation: one page of documents plus the metadata the hypermedia layer
//! needs to synthesize pagination links.

use bson::Document;

/// A single page of list results.
///
/// `total_items` and `page_count` are only present when the caller requested
/// a count alongside the page.
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// The documents on this page, in query order.
    pub items: Vec<Document>,
    /// The page number (1-indexed).
    pub page: u64,
    /// Total number of matching documents across all pages.
    pub total_items: Option<u64>,
    /// Derived number of pages.
    pub page_count: Option<u64>,
}

impl ListResult {
    /// Creates a result page without count information.
    pub fn new(items: Vec<Document>, page: u64) -> Self {
        Self {
            items,
            page,
            total_items: None,
            page_count: None,
        }
    }

    /// Attaches a total count and derives the page count from it.
    ///
    /// The page count divides the total by the number of items on the
    /// *current* page, not the fixed page size. A short final page therefore
    /// yields a larger page count than the page size would suggest; this
    /// quirk is part of the mapper's observable pagination contract and is
    /// kept intentionally. An empty page leaves the page count unset rather
    /// than dividing by zero.
    pub fn with_count(mut self, total: u64) -> Self {
        self.total_items = Some(total);
        self.page_count = match self.items.len() as u64 {
            0 => None,
            returned => Some(total.div_ceil(returned)),
        };
        self
    }
}
