//! HAL hypermedia resource construction.
//!
//! This module provides the hypermedia building blocks consumed by the
//! mapper's serialization functions: a [`HalResource`] wrapping a payload
//! with a self link, named relation links and embedded sub-resources, plus
//! the routing context contracts ([`UrlBuilder`], [`RequestContext`]) used to
//! address resources and rewrite list query strings.
//!
//! A resource serializes to the HAL JSON convention: payload fields inline,
//! links under `_links` (always including `self`), embedded collections
//! under `_embedded`.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Builds URLs for named routes.
///
/// Implemented by the HTTP layer's router; the mapper only ever asks for a
/// route name plus positional path parameters (the document id for detail
/// routes, nothing for list routes).
pub trait UrlBuilder {
    fn url(&self, route: &str, params: &[&str]) -> String;
}

/// The request context consumed by collection serialization: the router and
/// the raw query parameters of the current request.
pub trait RequestContext {
    fn router(&self) -> &dyn UrlBuilder;
    fn query(&self) -> &BTreeMap<String, String>;
}

/// A hypermedia resource: a JSON payload addressed by a self link, with
/// optional named relation links and embedded sub-resources.
#[derive(Debug, Clone)]
pub struct HalResource {
    payload: Map<String, Value>,
    self_href: String,
    links: Vec<(String, String)>,
    embedded: Vec<(String, Vec<HalResource>)>,
}

impl HalResource {
    /// Wraps a payload with its self link.
    ///
    /// A non-object payload is wrapped under no fields (empty payload); the
    /// mapper always passes objects.
    pub fn new(payload: Value, self_href: impl Into<String>) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            payload,
            self_href: self_href.into(),
            links: Vec::new(),
            embedded: Vec::new(),
        }
    }

    /// Attaches a named relation link.
    pub fn link(&mut self, rel: impl Into<String>, href: impl Into<String>) {
        self.links.push((rel.into(), href.into()));
    }

    /// Embeds a named collection of sub-resources.
    pub fn embed(&mut self, name: impl Into<String>, resources: Vec<HalResource>) {
        self.embedded.push((name.into(), resources));
    }

    /// Returns the self link href.
    pub fn self_href(&self) -> &str {
        &self.self_href
    }

    /// Returns the href of a named relation link, if attached.
    pub fn link_href(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|(name, _)| name == rel)
            .map(|(_, href)| href.as_str())
    }

    /// Serializes to the HAL JSON representation.
    pub fn to_json(&self) -> Value {
        let mut out = self.payload.clone();

        let mut links = Map::new();
        links.insert("self".to_string(), json!({ "href": self.self_href }));
        for (rel, href) in &self.links {
            links.insert(rel.clone(), json!({ "href": href }));
        }
        out.insert("_links".to_string(), Value::Object(links));

        if !self.embedded.is_empty() {
            let mut embedded = Map::new();
            for (name, resources) in &self.embedded {
                embedded.insert(
                    name.clone(),
                    Value::Array(resources.iter().map(HalResource::to_json).collect()),
                );
            }
            out.insert("_embedded".to_string(), Value::Object(embedded));
        }

        Value::Object(out)
    }
}

impl Serialize for HalResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Serializes query parameters into a query string with keys in sorted order
/// and percent-encoded names and values. Returns an empty string for an
/// empty mapping.
pub fn to_query_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
        })
        .collect::<Vec<_>>()
        .join("&")
}
