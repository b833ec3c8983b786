//! # Slotmark Editor
//!
//! Editing engine for text with atomic placeholder markers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: marker text → Document              │
//! │  - ComponentRegistry / Tokenizer            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditEngine + Mutations              │
//! │  - Placeholders stay atomic under edits     │
//! │  - Cursor in flattened units                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ChangeNotifier: debounced serialized value  │
//! │  → listeners (at most once per window)      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Document is source of truth**: emitted text is a derived view
//! 2. **Placeholders are atomic**: never split, deleted whole
//! 3. **Restore is silent**: loading content never notifies
//! 4. **Host drives time**: nothing fires outside `tick()` / `flush()`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use slotmark_editor::{EditSession, EditorConfig};
//!
//! let mut session = EditSession::new(&EditorConfig::default())?;
//! session.on_change(|event, _| println!("{}", event.value));
//!
//! session.set_content("Hi {@NAME}, use {TLJ-PLLJ-ABC}");
//! session.insert_component("emoji", Some("微笑"));
//!
//! // Host event loop
//! session.tick();
//! ```

mod change_notifier;
mod clock;
mod config;
mod engine;
mod errors;
mod mutations;
mod session;
mod value;

pub use change_notifier::{
    ChangeEvent, ChangeListener, ChangeNotifier, ChangeNotifierStats, ClearListener, ContentCleared,
    FollowUps, ListenerId, DEFAULT_DEBOUNCE_MS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EditorConfig, DEFAULT_CONFIG_NAME};
pub use engine::{EditApplied, EditEngine};
pub use errors::EditorError;
pub use mutations::{DeleteDirection, Mutation, MutationError};
pub use session::{AppendPosition, EditSession};
pub use value::{DynamicValue, ValueContext, ValueFn};

// Re-export parser types callers need
pub use slotmark_parser::{
    ComponentDefinition, ComponentRegistry, Document, Node, PlaceholderNode, RawValue,
    SerializeOptions, NULL_SENTINEL,
};
