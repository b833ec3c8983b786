//! # Edit Engine
//!
//! Owns the document and applies [`Mutation`]s to it. Every structural
//! change goes through here so placeholder atomicity holds everywhere.

use crate::mutations::{DeleteDirection, Mutation, MutationError};
use crate::value::{DynamicValue, ValueContext};
use serde::{Deserialize, Serialize};
use slotmark_parser::ast::{Document, Location, Node, PlaceholderNode, RawValue, TextRun, Unit};
use slotmark_parser::registry::CompiledComponent;
use slotmark_parser::{
    serialize, ComponentDefinition, ComponentRegistry, IDGenerator, RegistryError, SerializeOptions,
    Tokenizer,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of applying a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditApplied {
    /// Document version after the mutation
    pub version: u64,

    pub cursor: usize,

    /// False when the mutation was a no-op
    pub changed: bool,

    /// Id of the placeholder the mutation created, if any
    pub node_id: Option<String>,
}

pub struct EditEngine {
    document: Document,
    registry: ComponentRegistry,
    ids: IDGenerator,
    cursor: usize,
    /// Other end of the selection; `None` when collapsed at the cursor
    anchor: Option<usize>,
    version: u64,
}

impl EditEngine {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            document: Document::new(),
            registry,
            ids: IDGenerator::new(),
            cursor: 0,
            anchor: None,
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn register(&mut self, definition: ComponentDefinition) -> Result<(), RegistryError> {
        self.registry.register(definition)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, position: usize) {
        self.cursor = self.clamp(position);
        self.anchor = None;
    }

    /// Select `[start, end)`; the cursor sits at `end`
    pub fn select(&mut self, start: usize, end: usize) {
        self.anchor = Some(self.clamp(start));
        self.cursor = self.clamp(end);
    }

    /// Ordered selection bounds, `(cursor, cursor)` when collapsed
    pub fn selection(&self) -> (usize, usize) {
        let anchor = self.anchor.unwrap_or(self.cursor).min(self.document.len());
        (anchor.min(self.cursor), anchor.max(self.cursor))
    }

    pub fn serialize(&self, options: SerializeOptions) -> String {
        serialize(&self.document, &self.registry, options)
    }

    /// Apply a mutation with validation
    pub fn apply(&mut self, mutation: Mutation) -> Result<EditApplied, MutationError> {
        mutation.validate(&self.document)?;

        let kind = mutation.kind();
        let mut node_id = None;
        self.anchor = None;

        let changed = match mutation {
            Mutation::InsertPlaceholder {
                component_type,
                payload,
                position,
            } => {
                node_id = self.insert_placeholder(&component_type, payload, position);
                node_id.is_some()
            }
            Mutation::InsertText { text, position } => self.insert_text(&text, position),
            Mutation::DeleteAt {
                position,
                direction,
            } => self.delete_at(position, direction),
            Mutation::DeleteRange { start, end } => self.delete_range(start, end),
            Mutation::SetValue { node_id, value } => self.set_value(&node_id, value)?,
            Mutation::SetRestored { node_id, restored } => self.set_restored(&node_id, restored)?,
            Mutation::Restore { content } => self.restore(&content),
            Mutation::Clear => self.clear(),
        };

        if changed {
            self.version += 1;
        }
        debug!(mutation = kind, changed, version = self.version, "applied mutation");

        Ok(EditApplied {
            version: self.version,
            cursor: self.cursor,
            changed,
            node_id,
        })
    }

    /// Insert a placeholder whose payload and label may be computed
    pub fn insert_placeholder_with(
        &mut self,
        component_type: &str,
        payload: DynamicValue<Option<String>>,
        display_text: DynamicValue<String>,
        position: Option<usize>,
    ) -> Option<String> {
        let component = self.component(component_type)?;
        let position = self.clamp(position.unwrap_or(self.cursor));
        let ctx = ValueContext {
            definition: component.definition(),
            position,
        };

        let payload = payload.resolve(&ctx, None);
        let display_text = display_text.resolve(&ctx, component.default_label().to_string());

        let id = self.insert_node(&component, payload, display_text, position);
        self.version += 1;
        Some(id)
    }

    /// Insert a placeholder from a data item, reading the payload and label
    /// through the definition's `valueKey` / `labelKey`
    pub fn insert_item(
        &mut self,
        component_type: &str,
        item: &serde_json::Value,
        position: Option<usize>,
    ) -> Option<String> {
        let component = self.component(component_type)?;
        let definition = component.definition();

        let payload = item.get(&definition.value_key).and_then(json_scalar);
        let display_text = item
            .get(&definition.label_key)
            .and_then(json_scalar)
            .unwrap_or_else(|| component.default_label().to_string());

        let position = self.clamp(position.unwrap_or(self.cursor));
        let id = self.insert_node(&component, payload, display_text, position);
        self.version += 1;
        Some(id)
    }

    fn component(&self, component_type: &str) -> Option<Arc<CompiledComponent>> {
        let component = self.registry.lookup(component_type);
        if component.is_none() {
            warn!(component_type, "insert of unregistered component type ignored");
        }
        component
    }

    fn clamp(&self, position: usize) -> usize {
        position.min(self.document.len())
    }

    fn insert_placeholder(
        &mut self,
        component_type: &str,
        payload: Option<String>,
        position: Option<usize>,
    ) -> Option<String> {
        let component = self.component(component_type)?;
        let position = self.clamp(position.unwrap_or(self.cursor));
        let display_text = component.default_label().to_string();
        Some(self.insert_node(&component, payload, display_text, position))
    }

    fn insert_node(
        &mut self,
        component: &CompiledComponent,
        payload: Option<String>,
        display_text: String,
        position: usize,
    ) -> String {
        let definition = component.definition();
        let raw_value = if definition.needs_payload {
            payload
                .map(|p| component.payload_value(&p))
                .unwrap_or(RawValue::Unset)
        } else {
            RawValue::Set(definition.type_token().to_string())
        };

        let id = self.ids.new_id();
        let node = PlaceholderNode::new(&id, &definition.component_type, raw_value)
            .with_display_text(display_text);

        let index = self.document.split_at(position);
        self.document.nodes.insert(index, Node::Placeholder(node));
        self.cursor = position + 1;
        id
    }

    fn insert_text(&mut self, text: &str, position: Option<usize>) -> bool {
        if text.is_empty() {
            return false;
        }
        let position = self.clamp(position.unwrap_or(self.cursor));
        let fragment = Tokenizer::new(&self.registry).scan(text, &mut self.ids);
        let width = fragment.len();

        if fragment.placeholder_count() == 0 {
            self.merge_text(text, position);
        } else {
            let index = self.document.split_at(position);
            let count = fragment.nodes.len();
            self.document.nodes.splice(index..index, fragment.nodes);
            self.merge_adjacent_runs(index + count);
            self.merge_adjacent_runs(index);
        }

        self.cursor = position + width;
        true
    }

    /// Put plain text into an existing run where possible
    fn merge_text(&mut self, text: &str, position: usize) {
        match self.document.locate(position) {
            Location::InText { index, offset } => {
                if let Node::Text(run) = &mut self.document.nodes[index] {
                    let byte = run.byte_offset(offset);
                    run.content.insert_str(byte, text);
                }
            }
            Location::Boundary(index) => {
                let nodes = &mut self.document.nodes;
                if index > 0 {
                    if let Node::Text(run) = &mut nodes[index - 1] {
                        run.content.push_str(text);
                        return;
                    }
                }
                if let Some(Node::Text(run)) = nodes.get_mut(index) {
                    run.content.insert_str(0, text);
                    return;
                }
                nodes.insert(index, Node::Text(TextRun::new(text)));
            }
        }
    }

    /// Merge `nodes[index - 1]` and `nodes[index]` when both are text
    fn merge_adjacent_runs(&mut self, index: usize) {
        let nodes = &mut self.document.nodes;
        if index == 0 || index >= nodes.len() {
            return;
        }
        let right = match (&nodes[index - 1], &nodes[index]) {
            (Node::Text(_), Node::Text(right)) => right.content.clone(),
            _ => return,
        };
        if let Node::Text(left) = &mut nodes[index - 1] {
            left.content.push_str(&right);
        }
        nodes.remove(index);
    }

    fn delete_at(&mut self, position: Option<usize>, direction: DeleteDirection) -> bool {
        let position = self.clamp(position.unwrap_or(self.cursor));
        let unit = match direction {
            DeleteDirection::Backward if position == 0 => return false,
            DeleteDirection::Backward => position - 1,
            DeleteDirection::Forward => position,
        };

        match self.document.unit_at(unit) {
            Some(Unit::Char { index, offset }) => {
                if let Node::Text(run) = &mut self.document.nodes[index] {
                    let byte = run.byte_offset(offset);
                    run.content.remove(byte);
                }
            }
            Some(Unit::Placeholder { index }) => {
                self.document.nodes.remove(index);
            }
            None => return false,
        }

        self.document.remove_empty_runs();
        self.cursor = unit;
        true
    }

    fn delete_range(&mut self, start: usize, end: usize) -> bool {
        let (start, end) = (self.clamp(start.min(end)), self.clamp(start.max(end)));
        if start == end {
            return false;
        }

        let mut acc = 0;
        let mut nodes = Vec::with_capacity(self.document.nodes.len());
        for node in self.document.nodes.drain(..) {
            let width = node.width();
            let (from, to) = (acc, acc + width);
            acc = to;

            if to <= start || from >= end {
                nodes.push(node);
                continue;
            }
            match node {
                Node::Text(run) => {
                    let kept: String = run
                        .content
                        .chars()
                        .enumerate()
                        .filter(|(i, _)| {
                            let unit = from + i;
                            unit < start || unit >= end
                        })
                        .map(|(_, c)| c)
                        .collect();
                    nodes.push(Node::Text(TextRun::new(kept)));
                }
                // Overlapping placeholders go as a whole
                Node::Placeholder(_) => {}
            }
        }

        self.document.nodes = nodes;
        self.document.remove_empty_runs();
        self.cursor = start;
        true
    }

    fn set_value(&mut self, node_id: &str, value: RawValue) -> Result<bool, MutationError> {
        let component = self.find_component_for(node_id)?;
        let node = self
            .document
            .find_placeholder_mut(node_id)
            .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
        let before = node.clone();

        let value = match value {
            RawValue::Set(v) => match &component {
                Some(c) => c.payload_value(&v),
                None => RawValue::from_option(Some(v)),
            },
            RawValue::Unset => RawValue::Unset,
        };

        if value.is_unset() {
            // Keeps original_format so a restored node can be healed later
            node.raw_value = RawValue::Unset;
            node.is_restored = false;
        } else {
            if node.is_restored {
                node.display_text = match &component {
                    Some(c) => c.default_label().to_string(),
                    None => node.component_type.clone(),
                };
            }
            node.raw_value = value;
            node.original_format = None;
            node.is_restored = false;
        }

        Ok(*node != before)
    }

    fn set_restored(&mut self, node_id: &str, restored: bool) -> Result<bool, MutationError> {
        let node = self
            .document
            .find_placeholder_mut(node_id)
            .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
        let changed = node.is_restored != restored;
        node.is_restored = restored;
        Ok(changed)
    }

    fn find_component_for(&self, node_id: &str) -> Result<Option<Arc<CompiledComponent>>, MutationError> {
        let node = self
            .document
            .find_placeholder(node_id)
            .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;
        Ok(self.registry.lookup(&node.component_type))
    }

    /// Replace the document with restored marker text
    pub fn load(&mut self, content: &str) -> EditApplied {
        self.restore(content);
        self.version += 1;
        EditApplied {
            version: self.version,
            cursor: self.cursor,
            changed: true,
            node_id: None,
        }
    }

    fn clear(&mut self) -> bool {
        let changed = !self.document.nodes.is_empty();
        self.document = Document::new();
        self.cursor = 0;
        changed
    }

    fn restore(&mut self, content: &str) -> bool {
        self.document = Tokenizer::new(&self.registry).scan_restored(content, &mut self.ids);
        self.cursor = self.document.len();
        true
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
