//! # Document Model
//!
//! A document is a flat, ordered sequence of text runs and atomic
//! placeholder nodes. Order is visual (left-to-right) order.
//!
//! ## Positions
//!
//! Cursor and range positions are expressed in *flattened units*:
//! every character of a text run is one unit and every placeholder is
//! exactly one unit, no matter how long its marker text is. This keeps a
//! placeholder indivisible under any position-based edit.

use serde::{Deserialize, Serialize};

/// Literal value standing in for "no payload assigned yet"
pub const NULL_SENTINEL: &str = "<<NULL>>";

/// Payload of a placeholder node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    /// Nothing assigned; renders as [`NULL_SENTINEL`]
    Unset,
    Set(String),
}

impl RawValue {
    /// Build from an optional payload. Empty strings and the sentinel
    /// literal both collapse to `Unset`.
    pub fn from_option(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.is_empty() && v != NULL_SENTINEL => RawValue::Set(v),
            _ => RawValue::Unset,
        }
    }

    pub fn is_unset(&self) -> bool {
        match self {
            RawValue::Unset => true,
            RawValue::Set(v) => v.is_empty() || v == NULL_SENTINEL,
        }
    }

    /// Value as substituted into templates
    pub fn as_template_str(&self) -> &str {
        match self {
            RawValue::Set(v) if !self.is_unset() => v,
            _ => NULL_SENTINEL,
        }
    }

    pub fn as_option(&self) -> Option<&str> {
        match self {
            RawValue::Set(v) if !self.is_unset() => Some(v),
            _ => None,
        }
    }
}

impl Default for RawValue {
    fn default() -> Self {
        RawValue::Unset
    }
}

/// Literal text, editable character by character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,
}

impl TextRun {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Length in flattened units (characters)
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Byte offset of the character at `offset`, or the end of the run
    pub fn byte_offset(&self, offset: usize) -> usize {
        self.content
            .char_indices()
            .nth(offset)
            .map(|(byte, _)| byte)
            .unwrap_or(self.content.len())
    }

    /// Split into `(before, after)` at a character offset
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let byte = self.byte_offset(offset);
        (
            TextRun::new(&self.content[..byte]),
            TextRun::new(&self.content[byte..]),
        )
    }
}

/// Atomic structured span. Never partially edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderNode {
    pub id: String,

    #[serde(rename = "type")]
    pub component_type: String,

    pub raw_value: RawValue,

    pub display_text: String,

    /// Exact marker text this node was parsed from (if any)
    pub original_format: Option<String>,

    pub is_restored: bool,
}

impl PlaceholderNode {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>, raw_value: RawValue) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            raw_value,
            display_text: String::new(),
            original_format: None,
            is_restored: false,
        }
    }

    pub fn with_display_text(mut self, display_text: impl Into<String>) -> Self {
        self.display_text = display_text.into();
        self
    }

    pub fn with_original_format(mut self, original_format: impl Into<String>) -> Self {
        self.original_format = Some(original_format.into());
        self
    }

    pub fn restored(mut self, is_restored: bool) -> Self {
        self.is_restored = is_restored;
        self
    }

    /// Unset and not restored: not yet filled, invalid for transmission
    pub fn is_empty(&self) -> bool {
        self.raw_value.is_unset() && !self.is_restored
    }
}

/// Document node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    Text(TextRun),
    Placeholder(PlaceholderNode),
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(TextRun::new(content))
    }

    /// Width in flattened units
    pub fn width(&self) -> usize {
        match self {
            Node::Text(run) => run.char_len(),
            Node::Placeholder(_) => 1,
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Text(run) => Some(run),
            Node::Placeholder(_) => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&PlaceholderNode> {
        match self {
            Node::Placeholder(node) => Some(node),
            Node::Text(_) => None,
        }
    }

    pub fn as_placeholder_mut(&mut self) -> Option<&mut PlaceholderNode> {
        match self {
            Node::Placeholder(node) => Some(node),
            Node::Text(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Node::Placeholder(_))
    }
}

/// Where a flattened position falls inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Directly before `nodes[index]` (or at the end when `index == len`)
    Boundary(usize),

    /// Strictly inside the text run at `index`, `offset` characters in
    InText { index: usize, offset: usize },
}

/// The unit covering one flattened index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// A character of the text run at `index`
    Char { index: usize, offset: usize },

    /// The placeholder at `index`
    Placeholder { index: usize },
}

/// Root document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Total length in flattened units
    pub fn len(&self) -> usize {
        self.nodes.iter().map(Node::width).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|node| node.width() == 0)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderNode> {
        self.nodes.iter().filter_map(Node::as_placeholder)
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }

    pub fn find_placeholder(&self, id: &str) -> Option<&PlaceholderNode> {
        self.placeholders().find(|node| node.id == id)
    }

    pub fn find_placeholder_mut(&mut self, id: &str) -> Option<&mut PlaceholderNode> {
        self.nodes
            .iter_mut()
            .filter_map(Node::as_placeholder_mut)
            .find(|node| node.id == id)
    }

    /// Resolve a flattened position (clamped to the document length)
    pub fn locate(&self, position: usize) -> Location {
        let mut acc = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            if position <= acc {
                return Location::Boundary(index);
            }
            let width = node.width();
            if let Node::Text(_) = node {
                if position < acc + width {
                    return Location::InText {
                        index,
                        offset: position - acc,
                    };
                }
            }
            acc += width;
        }
        Location::Boundary(self.nodes.len())
    }

    /// Unit covering flattened index `unit`, if any
    pub fn unit_at(&self, unit: usize) -> Option<Unit> {
        let mut acc = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            let width = node.width();
            if unit < acc + width {
                return Some(match node {
                    Node::Text(_) => Unit::Char {
                        index,
                        offset: unit - acc,
                    },
                    Node::Placeholder(_) => Unit::Placeholder { index },
                });
            }
            acc += width;
        }
        None
    }

    /// Make sure a node boundary exists at `position`, splitting a text
    /// run when needed. Returns the node index to insert at.
    pub fn split_at(&mut self, position: usize) -> usize {
        match self.locate(position) {
            Location::Boundary(index) => index,
            Location::InText { index, offset } => {
                let (before, after) = match &self.nodes[index] {
                    Node::Text(run) => run.split_at(offset),
                    Node::Placeholder(_) => return index,
                };
                self.nodes[index] = Node::Text(before);
                self.nodes.insert(index + 1, Node::Text(after));
                index + 1
            }
        }
    }

    /// Drop text runs that became empty
    pub fn remove_empty_runs(&mut self) {
        self.nodes.retain(|node| match node {
            Node::Text(run) => !run.is_empty(),
            Node::Placeholder(_) => true,
        });
    }

    /// Plain text of the document, placeholders rendered by display text
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(run) => out.push_str(&run.content),
                Node::Placeholder(p) => out.push_str(&p.display_text),
            }
        }
        out
    }
}
