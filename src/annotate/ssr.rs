//! SSR marker algorithm
//!
//! Three passes over the document body:
//!
//! 1. **Component ids**: breadth-first from the body's children, every
//!    element carrying the marker class gets the next value of a counter
//!    (`ssrv`), so all components of one depth are numbered before any
//!    component one level deeper.
//! 2. **Coordinates**: every element below the body gets
//!    `ssrc = "<owner>.<index>"`, where `owner` is the id of its nearest
//!    component ancestor (or its own id, or empty), `index` is its position
//!    among its parent's element children, and a trailing `.` marks an
//!    element with no nested component anywhere below it.
//! 3. **Stamp**: the `<html>` element gets `ssr` set to the render time.

use crate::annotate::tree::{Document, NodeId};
use crate::config::AnnotateConfig;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const SSR_VALUE_ATTR: &str = "ssrv";
pub const SSR_COORDINATE_ATTR: &str = "ssrc";
pub const SSR_TIMESTAMP_ATTR: &str = "ssr";

/// Hands out component ids for one annotation run
#[derive(Debug, Default)]
struct SsrCounter {
    next: u64,
}

impl SsrCounter {
    fn next(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }
}

/// Component ids assigned by the first pass
type ComponentIds = HashMap<NodeId, u64>;

/// Stamps rendered HTML with SSR markers
#[derive(Debug, Clone)]
pub struct Annotator {
    marker_class: String,
    transparent_tag: String,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::from_config(&AnnotateConfig::default())
    }
}

impl Annotator {
    pub fn new(marker_class: impl Into<String>, transparent_tag: impl Into<String>) -> Self {
        Self {
            marker_class: marker_class.into(),
            transparent_tag: transparent_tag.into(),
        }
    }

    pub fn from_config(config: &AnnotateConfig) -> Self {
        Self::new(config.marker_class.clone(), config.transparent_tag.clone())
    }

    /// Annotates `html`, stamping it with the current time
    pub fn annotate(&self, html: &str) -> String {
        self.annotate_at(html, Utc::now())
    }

    /// Annotates `html` with an explicit render timestamp
    pub fn annotate_at(&self, html: &str, rendered_at: DateTime<Utc>) -> String {
        let mut doc = Document::parse(html);
        self.annotate_document(&mut doc, rendered_at);
        doc.to_html()
    }

    /// Runs all three passes on an already parsed document
    pub fn annotate_document(&self, doc: &mut Document, rendered_at: DateTime<Utc>) {
        if let Some(body) = doc.body() {
            let ids = self.assign_component_ids(doc, body);
            self.assign_coordinates(doc, body, &ids);
            tracing::trace!("Annotated {} components", ids.len());
        }

        if let Some(html) = doc.html_element() {
            doc.set_attr(html, SSR_TIMESTAMP_ATTR, format_timestamp(rendered_at));
        }
    }

    fn is_component(&self, doc: &Document, id: NodeId) -> bool {
        doc.element(id)
            .map(|element| element.has_class(&self.marker_class))
            .unwrap_or(false)
    }

    fn is_transparent(&self, doc: &Document, id: NodeId) -> bool {
        doc.is_element_named(id, &self.transparent_tag)
    }

    fn assign_component_ids(&self, doc: &mut Document, body: NodeId) -> ComponentIds {
        let mut counter = SsrCounter::default();
        let mut ids = ComponentIds::new();

        let mut level: Vec<NodeId> = doc.element_children(body).collect();
        while !level.is_empty() {
            let mut next_level = Vec::new();
            for &id in &level {
                if self.is_component(doc, id) {
                    let value = counter.next();
                    doc.set_attr(id, SSR_VALUE_ATTR, value.to_string());
                    ids.insert(id, value);
                }
                next_level.extend(doc.element_children(id));
            }
            level = next_level;
        }

        ids
    }

    fn assign_coordinates(&self, doc: &mut Document, body: NodeId, ids: &ComponentIds) {
        let elements = doc.descendant_elements(body);
        let nested = self.nested_components(doc, &elements);

        let mut coordinates = Vec::with_capacity(elements.len());
        for &parent in std::iter::once(&body).chain(elements.iter()) {
            for (index, child) in doc.element_children(parent).enumerate() {
                let owner = owning_component(doc, body, ids, child)
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                let leaf = if nested.get(&child).copied().unwrap_or(false) {
                    ""
                } else {
                    "."
                };
                coordinates.push((child, format!("{}.{}{}", owner, index, leaf)));
            }
        }

        for (id, coordinate) in coordinates {
            doc.set_attr(id, SSR_COORDINATE_ATTR, coordinate);
        }
    }

    /// For every element, whether a component sits anywhere below it
    ///
    /// `elements` must be in document order so that walking it backwards
    /// visits every child before its parent. Elements named by the
    /// transparent tag never count as components themselves; only what they
    /// contain does.
    fn nested_components(&self, doc: &Document, elements: &[NodeId]) -> HashMap<NodeId, bool> {
        let mut nested: HashMap<NodeId, bool> = HashMap::with_capacity(elements.len());
        for &id in elements.iter().rev() {
            let has_nested = doc.element_children(id).any(|child| {
                (self.is_component(doc, child) && !self.is_transparent(doc, child))
                    || nested.get(&child).copied().unwrap_or(false)
            });
            nested.insert(id, has_nested);
        }
        nested
    }
}

/// Nearest component strictly above `id` (stopping at the body), else `id` itself
fn owning_component(doc: &Document, body: NodeId, ids: &ComponentIds, id: NodeId) -> Option<u64> {
    let mut current = doc.parent(id);
    while let Some(ancestor) = current {
        if ancestor == body {
            break;
        }
        if let Some(&value) = ids.get(&ancestor) {
            return Some(value);
        }
        current = doc.parent(ancestor);
    }
    ids.get(&id).copied()
}

/// Sortable UTC timestamp, e.g. `2024-05-01T12:30:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Annotates `html` with the default marker class (`hydrated`)
pub fn annotate(html: &str) -> String {
    Annotator::default().annotate(html)
}
