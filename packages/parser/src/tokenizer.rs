//! Marker tokenizer: splits free text into text runs and placeholder nodes.
//!
//! Every registered type contributes candidate matches from each of its
//! matchers. Candidates are ordered by start offset (ties keep registration
//! order, then matcher order) and accepted greedily left to right; any
//! candidate overlapping an accepted one is dropped.

use crate::ast::{Document, Node, PlaceholderNode, RawValue, NULL_SENTINEL};
use crate::id_generator::IDGenerator;
use crate::registry::{CompiledComponent, ComponentRegistry};
use std::sync::Arc;
use tracing::trace;

/// One accepted marker occurrence
#[derive(Debug, Clone)]
pub struct MarkerMatch {
    pub start: usize,
    pub end: usize,
    pub component: Arc<CompiledComponent>,
    pub payload: Option<String>,
}

impl MarkerMatch {
    pub fn raw<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Tokenizer over a snapshot of the registry. Later registrations do not
/// affect a tokenizer that already exists.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    components: Vec<Arc<CompiledComponent>>,
}

impl Tokenizer {
    pub fn new(registry: &ComponentRegistry) -> Self {
        Self {
            components: registry.snapshot(),
        }
    }

    /// All non-overlapping marker occurrences, left to right
    pub fn find_markers(&self, text: &str) -> Vec<MarkerMatch> {
        let mut candidates = Vec::new();

        for component in &self.components {
            let needs_payload = component.definition().needs_payload;
            for matcher in component.matchers() {
                for caps in matcher.regex().captures_iter(text) {
                    let Some(whole) = caps.get(0) else { continue };
                    if whole.as_str().is_empty() || whole.as_str().contains(NULL_SENTINEL) {
                        continue;
                    }
                    let payload = matcher
                        .payload_group()
                        .and_then(|group| caps.get(group))
                        .map(|m| m.as_str().to_string())
                        .filter(|p| !p.is_empty());
                    if needs_payload && payload.is_none() {
                        continue;
                    }
                    candidates.push(MarkerMatch {
                        start: whole.start(),
                        end: whole.end(),
                        component: component.clone(),
                        payload,
                    });
                }
            }
        }

        // Stable: equal starts keep registration order
        candidates.sort_by_key(|c| c.start);

        let mut cursor = 0;
        let mut accepted = Vec::new();
        for candidate in candidates {
            if candidate.start >= cursor {
                cursor = candidate.end;
                accepted.push(candidate);
            }
        }
        accepted
    }

    pub fn contains_markers(&self, text: &str) -> bool {
        !self.find_markers(text).is_empty()
    }

    /// Tokenize `text`; nodes are marked restored when `restored` is set
    pub fn scan_with(&self, text: &str, ids: &mut IDGenerator, restored: bool) -> Document {
        let mut nodes = Vec::new();
        let mut last = 0;

        for marker in self.find_markers(text) {
            if marker.start > last {
                nodes.push(Node::text(&text[last..marker.start]));
            }
            nodes.push(Node::Placeholder(self.build_node(&marker, text, ids, restored)));
            last = marker.end;
        }
        if last < text.len() {
            nodes.push(Node::text(&text[last..]));
        }

        trace!(nodes = nodes.len(), restored, "scanned text");
        Document::from_nodes(nodes)
    }

    pub fn scan(&self, text: &str, ids: &mut IDGenerator) -> Document {
        self.scan_with(text, ids, false)
    }

    pub fn scan_restored(&self, text: &str, ids: &mut IDGenerator) -> Document {
        self.scan_with(text, ids, true)
    }

    fn build_node(
        &self,
        marker: &MarkerMatch,
        text: &str,
        ids: &mut IDGenerator,
        restored: bool,
    ) -> PlaceholderNode {
        let definition = marker.component.definition();
        let raw = marker.raw(text);

        let raw_value = if definition.needs_payload {
            RawValue::from_option(marker.payload.clone())
        } else {
            RawValue::Set(definition.type_token().to_string())
        };

        let display_text = if restored {
            raw.to_string()
        } else {
            marker.component.default_label().to_string()
        };

        PlaceholderNode::new(ids.new_id(), &definition.component_type, raw_value)
            .with_display_text(display_text)
            .with_original_format(raw)
            .restored(restored)
    }
}

/// Tokenize with a fresh id generator
pub fn scan(text: &str, registry: &ComponentRegistry) -> Document {
    Tokenizer::new(registry).scan(text, &mut IDGenerator::new())
}

/// Tokenize marking every placeholder as restored
pub fn scan_restored(text: &str, registry: &ComponentRegistry) -> Document {
    Tokenizer::new(registry).scan_restored(text, &mut IDGenerator::new())
}
