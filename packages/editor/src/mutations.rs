//! # Edit Mutations
//!
//! Commands accepted by the [`EditEngine`](crate::EditEngine).
//!
//! ## Semantics
//!
//! ### Placeholders are atomic
//! - Any delete touching a placeholder removes the whole node
//! - Text never splits a placeholder; inserting inside a run splits the run
//!
//! ### Positions
//! - Flattened units (one per character, one per placeholder)
//! - `None` means "at the cursor"; out-of-range values are clamped
//!
//! ### Failure
//! - Unknown component types are a logged no-op, not an error
//! - Unknown node ids are the only hard failure

use slotmark_parser::ast::{Document, RawValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which unit a single-unit delete removes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DeleteDirection {
    /// The unit before the position (backspace)
    Backward,
    /// The unit after the position (delete)
    Forward,
}

/// Edit commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a new placeholder of a registered type
    #[serde(rename_all = "camelCase")]
    InsertPlaceholder {
        component_type: String,
        payload: Option<String>,
        position: Option<usize>,
    },

    /// Insert text; markers inside it become placeholders
    InsertText {
        text: String,
        position: Option<usize>,
    },

    /// Remove one unit next to a position
    DeleteAt {
        position: Option<usize>,
        direction: DeleteDirection,
    },

    /// Remove every unit in `[start, end)`
    DeleteRange { start: usize, end: usize },

    #[serde(rename_all = "camelCase")]
    SetValue { node_id: String, value: RawValue },

    #[serde(rename_all = "camelCase")]
    SetRestored { node_id: String, restored: bool },

    /// Replace the whole document with restored marker text
    Restore { content: String },

    /// Remove everything
    Clear,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

impl Mutation {
    /// Check references against the document before applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::SetValue { node_id, .. } | Mutation::SetRestored { node_id, .. } => {
                if doc.find_placeholder(node_id).is_none() {
                    return Err(MutationError::NodeNotFound(node_id.clone()));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::InsertPlaceholder { .. } => "insert_placeholder",
            Mutation::InsertText { .. } => "insert_text",
            Mutation::DeleteAt { .. } => "delete_at",
            Mutation::DeleteRange { .. } => "delete_range",
            Mutation::SetValue { .. } => "set_value",
            Mutation::SetRestored { .. } => "set_restored",
            Mutation::Restore { .. } => "restore",
            Mutation::Clear => "clear",
        }
    }
}
