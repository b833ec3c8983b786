//! # Edit Session
//!
//! Public face of the editor: one document, its engine, and the change
//! notifier, driven cooperatively by the host through [`EditSession::tick`].

use crate::change_notifier::{
    ChangeEvent, ChangeNotifier, ChangeNotifierStats, ContentCleared, FollowUps, ListenerId,
};
use crate::clock::{Clock, SystemClock};
use crate::config::EditorConfig;
use crate::engine::{EditApplied, EditEngine};
use crate::mutations::{DeleteDirection, Mutation};
use crate::value::DynamicValue;
use crate::EditorError;
use slotmark_parser::{ComponentDefinition, Document, RawValue, SerializeOptions};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Work deferred to the next tick
#[derive(Debug, Clone, PartialEq, Eq)]
enum TickTask {
    /// Re-announce a freshly inserted node once it has settled
    Refresh(String),
}

/// Which end of the selection [`EditSession::append_text`] writes at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppendPosition {
    Before,
    #[default]
    After,
}

pub struct EditSession {
    engine: EditEngine,
    notifier: ChangeNotifier,
    options: SerializeOptions,
    next_tick: VecDeque<TickTask>,
    disabled: bool,
}

impl EditSession {
    pub fn new(config: &EditorConfig) -> Result<Self, EditorError> {
        Self::with_clock(config, Rc::new(SystemClock))
    }

    pub fn with_clock(config: &EditorConfig, clock: Rc<dyn Clock>) -> Result<Self, EditorError> {
        let registry = config.build_registry()?;
        info!(
            components = registry.len(),
            debounce_ms = config.debounce_ms,
            "edit session created"
        );
        Ok(Self {
            engine: EditEngine::new(registry),
            notifier: ChangeNotifier::new(clock, config.debounce()),
            options: config.serialize_options(),
            next_tick: VecDeque::new(),
            disabled: config.disabled,
        })
    }

    /// Session configured from `slotmark.config.json` in `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config = EditorConfig::load(dir)?;
        Self::new(&config)
    }

    pub fn register_component_type(&mut self, definition: ComponentDefinition) -> Result<(), EditorError> {
        self.engine.register(definition)?;
        Ok(())
    }

    /// Read-only mode: user edits become logged no-ops
    pub fn set_disabled(&mut self, disabled: bool) {
        if self.disabled != disabled {
            info!(disabled, "edit session mode changed");
        }
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn edits_blocked(&self, action: &str) -> bool {
        if self.disabled {
            debug!(action, "session is disabled, edit ignored");
        }
        self.disabled
    }

    fn unchanged(&self) -> EditApplied {
        EditApplied {
            version: self.engine.version(),
            cursor: self.engine.cursor(),
            changed: false,
            node_id: None,
        }
    }

    /// Load restored marker text. Emits nothing; reloading the same
    /// content with no edits in between does nothing.
    pub fn set_content(&mut self, content: &str) {
        if self.notifier.is_current_load(content) {
            debug!("content unchanged since last load");
            return;
        }
        self.load(content);
    }

    fn load(&mut self, content: &str) -> EditApplied {
        self.notifier.begin_restore();
        let applied = self.engine.load(content);
        if applied.changed {
            self.notifier.schedule();
        }
        let value = self.engine.serialize(self.options);
        self.notifier.finish_restore(content, self.engine.document(), value);
        applied
    }

    /// Apply any mutation, scheduling a change notification when it changed
    /// the document
    pub fn apply(&mut self, mutation: Mutation) -> Result<EditApplied, EditorError> {
        if let Mutation::Restore { content } = &mutation {
            return Ok(self.load(content));
        }
        if self.edits_blocked(mutation.kind()) {
            return Ok(self.unchanged());
        }

        let applied = self.engine.apply(mutation)?;
        if applied.changed {
            self.notifier.schedule();
        }
        Ok(applied)
    }

    /// User insert of a placeholder at the cursor. Returns the new node id,
    /// or `None` when the type is not registered.
    pub fn insert_component(&mut self, component_type: &str, payload: Option<&str>) -> Option<String> {
        let applied = self
            .apply(Mutation::InsertPlaceholder {
                component_type: component_type.to_string(),
                payload: payload.map(str::to_string),
                position: None,
            })
            .ok()?;
        self.after_insert(applied.node_id)
    }

    pub fn insert_component_with(
        &mut self,
        component_type: &str,
        payload: DynamicValue<Option<String>>,
        display_text: DynamicValue<String>,
    ) -> Option<String> {
        if self.edits_blocked("insert_placeholder") {
            return None;
        }
        let id = self
            .engine
            .insert_placeholder_with(component_type, payload, display_text, None);
        if id.is_some() {
            self.notifier.schedule();
        }
        self.after_insert(id)
    }

    pub fn insert_item(&mut self, component_type: &str, item: &serde_json::Value) -> Option<String> {
        if self.edits_blocked("insert_item") {
            return None;
        }
        let id = self.engine.insert_item(component_type, item, None);
        if id.is_some() {
            self.notifier.schedule();
        }
        self.after_insert(id)
    }

    fn after_insert(&mut self, node_id: Option<String>) -> Option<String> {
        let id = node_id?;
        self.next_tick.push_back(TickTask::Refresh(id.clone()));
        Some(id)
    }

    pub fn insert_text(&mut self, text: &str) -> Result<EditApplied, EditorError> {
        self.apply(Mutation::InsertText {
            text: text.to_string(),
            position: None,
        })
    }

    /// Insert text at one end of the current selection; the cursor ends up
    /// after the inserted text
    pub fn append_text(&mut self, text: &str, at: AppendPosition) -> Result<EditApplied, EditorError> {
        let (start, end) = self.engine.selection();
        let position = match at {
            AppendPosition::Before => start,
            AppendPosition::After => end,
        };
        self.apply(Mutation::InsertText {
            text: text.to_string(),
            position: Some(position),
        })
    }

    /// Remove everything and tell clear listeners right away. The emptied
    /// value still goes out through the regular debounced change.
    pub fn clear_content(&mut self) -> Result<EditApplied, EditorError> {
        if self.edits_blocked("clear") {
            return Ok(self.unchanged());
        }
        let applied = self.apply(Mutation::Clear)?;
        self.notifier.notify_cleared(applied.version);
        info!(version = applied.version, "content cleared");
        Ok(applied)
    }

    pub fn delete_backward(&mut self) -> Result<EditApplied, EditorError> {
        self.apply(Mutation::DeleteAt {
            position: None,
            direction: DeleteDirection::Backward,
        })
    }

    pub fn delete_forward(&mut self) -> Result<EditApplied, EditorError> {
        self.apply(Mutation::DeleteAt {
            position: None,
            direction: DeleteDirection::Forward,
        })
    }

    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<EditApplied, EditorError> {
        self.apply(Mutation::DeleteRange { start, end })
    }

    pub fn set_value(&mut self, node_id: &str, value: RawValue) -> Result<EditApplied, EditorError> {
        self.apply(Mutation::SetValue {
            node_id: node_id.to_string(),
            value,
        })
    }

    pub fn set_cursor(&mut self, position: usize) {
        self.engine.set_cursor(position);
    }

    pub fn select(&mut self, start: usize, end: usize) {
        self.engine.select(start, end);
    }

    pub fn selection(&self) -> (usize, usize) {
        self.engine.selection()
    }

    pub fn cursor(&self) -> usize {
        self.engine.cursor()
    }

    pub fn version(&self) -> u64 {
        self.engine.version()
    }

    /// Serialized document
    pub fn content(&self, filter_empty: bool) -> String {
        self.engine.serialize(SerializeOptions {
            filter_empty,
            ..self.options
        })
    }

    pub fn content_default(&self) -> String {
        self.engine.serialize(self.options)
    }

    pub fn raw_document(&self) -> &Document {
        self.engine.document()
    }

    /// Document as JSON for renderers
    pub fn document_json(&self) -> serde_json::Value {
        serde_json::to_value(self.engine.document()).unwrap_or_default()
    }

    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent, &mut FollowUps) + 'static,
    {
        self.notifier.add_listener(listener)
    }

    pub fn on_content_cleared<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ContentCleared) + 'static,
    {
        self.notifier.add_clear_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    /// Run next-tick tasks, then fire the debounce window if it is due
    pub fn tick(&mut self) {
        self.run_next_tick();
        if self.notifier.is_due() {
            self.run_cycle();
        }
    }

    /// Fire a pending window right away
    pub fn flush(&mut self) {
        self.run_next_tick();
        if self.notifier.is_pending() {
            self.run_cycle();
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.notifier.deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.notifier.is_pending() || !self.next_tick.is_empty()
    }

    pub fn stats(&self) -> &ChangeNotifierStats {
        self.notifier.stats()
    }

    fn run_next_tick(&mut self) {
        while let Some(task) = self.next_tick.pop_front() {
            match task {
                TickTask::Refresh(node_id) => {
                    if self.engine.document().find_placeholder(&node_id).is_some() {
                        self.notifier.schedule();
                    }
                }
            }
        }
    }

    fn run_cycle(&mut self) {
        self.notifier.begin_cycle();

        for node_id in self.notifier.nodes_to_heal(self.engine.document()) {
            let mutation = Mutation::SetRestored {
                node_id: node_id.clone(),
                restored: true,
            };
            match self.engine.apply(mutation) {
                Ok(applied) if applied.changed => self.notifier.record_heal(&node_id),
                Ok(_) => {}
                Err(err) => warn!(node_id = %node_id, error = %err, "heal failed"),
            }
        }

        let value = self.engine.serialize(self.options);
        let follow_ups = self.notifier.emit(value, self.engine.version());

        for mutation in follow_ups {
            if let Err(err) = self.apply(mutation) {
                warn!(error = %err, "follow-up mutation failed");
            }
        }

        self.notifier.end_cycle();
    }
}
