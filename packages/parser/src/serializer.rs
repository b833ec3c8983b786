use crate::ast::*;
use crate::registry::ComponentRegistry;
use crate::visitor::Visitor;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Output switches for [`Serializer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializeOptions {
    /// Omit placeholders that are unset and not restored
    pub filter_empty: bool,

    /// Echo `original_format` instead of re-rendering
    pub restore_mode: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            filter_empty: true,
            restore_mode: false,
        }
    }
}

/// Serializer converts a document back to canonical marker text
///
/// Text runs are emitted verbatim, placeholders through their type's
/// template (or their original format under restore mode). Whitespace in
/// the final output is collapsed and trimmed.
pub struct Serializer<'r> {
    registry: &'r ComponentRegistry,
    options: SerializeOptions,
    output: String,
}

impl<'r> Serializer<'r> {
    pub fn new(registry: &'r ComponentRegistry, options: SerializeOptions) -> Self {
        Self {
            registry,
            options,
            output: String::new(),
        }
    }

    pub fn serialize(mut self, doc: &Document) -> String {
        self.visit_document(doc);
        normalize_whitespace(&self.output)
    }

    fn render_placeholder(&self, node: &PlaceholderNode) -> String {
        if self.options.restore_mode {
            if let Some(original) = &node.original_format {
                return original.clone();
            }
        }

        match self.registry.lookup(&node.component_type) {
            Some(component) => component.render(node),
            None => match &node.original_format {
                Some(original) => original.clone(),
                // Without a template the node degrades to its bare value
                None => {
                    warn!(
                        component_type = %node.component_type,
                        node_id = %node.id,
                        "no template for placeholder type, writing its value as text"
                    );
                    node.raw_value.as_option().unwrap_or_default().to_string()
                }
            },
        }
    }
}

impl<'r> Visitor for Serializer<'r> {
    fn visit_text(&mut self, run: &TextRun) {
        self.output.push_str(&run.content);
    }

    fn visit_placeholder(&mut self, node: &PlaceholderNode) {
        if self.options.filter_empty && node.is_empty() {
            return;
        }
        let rendered = self.render_placeholder(node);
        self.output.push_str(&rendered);
    }
}

/// Collapse runs of whitespace to one space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Serialize a document to marker text
pub fn serialize(doc: &Document, registry: &ComponentRegistry, options: SerializeOptions) -> String {
    Serializer::new(registry, options).serialize(doc)
}
