//! # Change Notification
//!
//! Debounced delivery of the serialized document to observers.
//!
//! - Every edit resets a single timer; when it fires, the document is
//!   serialized once and listeners are called at most once.
//! - While a cycle runs (`updating`), new edits only set a deferred flag.
//!   One fresh window is scheduled when the cycle ends.
//! - While content is being restored, edits neither schedule nor emit.
//! - A value equal to the last emitted one is not emitted again.
//! - Nodes loaded by the last restore whose value went unset get their
//!   restored flag back before serializing.
//! - Clearing the document is announced right away to clear listeners, on
//!   top of the regular debounced change.

use crate::clock::Clock;
use crate::mutations::Mutation;
use serde::{Deserialize, Serialize};
use slotmark_parser::ast::{Document, PlaceholderNode};
use slotmark_parser::visitor::Visitor;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default debounce window
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Listener handle
pub type ListenerId = usize;

/// Payload delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub value: String,
    pub version: u64,
}

/// Mutations a listener wants applied once the current cycle ends
#[derive(Debug, Default)]
pub struct FollowUps {
    mutations: Vec<Mutation>,
}

impl FollowUps {
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

/// Delivered immediately when the whole document is cleared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCleared {
    pub version: u64,
}

pub type ChangeListener = Box<dyn FnMut(&ChangeEvent, &mut FollowUps)>;
pub type ClearListener = Box<dyn FnMut(&ContentCleared)>;

/// Counters for observability and tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeNotifierStats {
    /// Debounce windows that fired
    pub cycles: usize,
    pub emitted: usize,
    /// Cycles whose value equaled the last emitted one
    pub suppressed: usize,
    pub healed: usize,
    /// Edits that arrived during a cycle
    pub deferred: usize,
}

pub struct ChangeNotifier {
    clock: Rc<dyn Clock>,
    debounce: Duration,
    deadline: Option<Instant>,
    updating: bool,
    restoring: bool,
    deferred: bool,
    last_emitted: Option<String>,
    cached: String,
    /// Content of the last restore, until the next edit
    loaded: Option<String>,
    restored_ids: HashSet<String>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    clear_listeners: Vec<(ListenerId, ClearListener)>,
    next_listener_id: ListenerId,
    stats: ChangeNotifierStats,
}

impl ChangeNotifier {
    pub fn new(clock: Rc<dyn Clock>, debounce: Duration) -> Self {
        Self {
            clock,
            debounce,
            deadline: None,
            updating: false,
            restoring: false,
            deferred: false,
            last_emitted: None,
            cached: String::new(),
            loaded: None,
            restored_ids: HashSet::new(),
            listeners: Vec::new(),
            clear_listeners: Vec::new(),
            next_listener_id: 0,
            stats: ChangeNotifierStats::default(),
        }
    }

    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent, &mut FollowUps) + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn add_clear_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ContentCleared) + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.clear_listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a change or clear listener
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listener_count();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.clear_listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listener_count() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len() + self.clear_listeners.len()
    }

    pub fn notify_cleared(&mut self, version: u64) {
        let event = ContentCleared { version };
        for (_, listener) in self.clear_listeners.iter_mut() {
            listener(&event);
        }
        debug!(version, listeners = self.clear_listeners.len(), "content cleared");
    }

    /// Record that the document changed. Changes made while a restore is in
    /// progress (the load itself, or a follow-up restore queued by a
    /// listener) are absorbed into the restore baseline.
    pub fn schedule(&mut self) {
        self.loaded = None;

        if self.restoring {
            trace!("change during restore ignored");
            return;
        }
        if self.updating {
            self.deferred = true;
            self.stats.deferred += 1;
            trace!("change during update deferred");
            return;
        }

        // Last edit wins: the window restarts
        self.deadline = Some(self.clock.now() + self.debounce);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self) -> bool {
        match self.deadline {
            Some(deadline) => self.clock.now() >= deadline,
            None => false,
        }
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Whether `content` is what the last restore loaded, with no edits since
    pub fn is_current_load(&self, content: &str) -> bool {
        self.loaded.as_deref() == Some(content)
    }

    pub fn begin_restore(&mut self) {
        self.restoring = true;
        self.deadline = None;
    }

    /// Finish a restore: `value` becomes the baseline, nothing is emitted
    pub fn finish_restore(&mut self, content: &str, doc: &Document, value: String) {
        self.restored_ids = doc.placeholders().map(|p| p.id.clone()).collect();
        self.loaded = Some(content.to_string());
        self.last_emitted = Some(value.clone());
        self.cached = value;
        self.restoring = false;
        debug!(restored = self.restored_ids.len(), "content restored");
    }

    /// Restored nodes whose value went unset and lost their restored flag
    pub fn nodes_to_heal(&self, doc: &Document) -> Vec<String> {
        let mut finder = StrayNullFinder {
            restored_ids: &self.restored_ids,
            found: Vec::new(),
        };
        finder.visit_document(doc);
        finder.found
    }

    pub fn record_heal(&mut self, node_id: &str) {
        self.stats.healed += 1;
        debug!(node_id, "re-marked restored node");
    }

    pub fn begin_cycle(&mut self) {
        self.updating = true;
        self.deadline = None;
        self.stats.cycles += 1;
    }

    /// Deliver `value` unless it equals the last emitted one. Returns the
    /// follow-up mutations listeners queued.
    pub fn emit(&mut self, value: String, version: u64) -> Vec<Mutation> {
        self.cached = value.clone();

        if self.last_emitted.as_deref() == Some(value.as_str()) {
            self.stats.suppressed += 1;
            trace!(version, "value unchanged, not emitted");
            return Vec::new();
        }

        self.last_emitted = Some(value.clone());
        self.stats.emitted += 1;

        let event = ChangeEvent { value, version };
        let mut follow_ups = FollowUps::default();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, &mut follow_ups);
        }

        debug!(version, listeners = self.listeners.len(), follow_ups = follow_ups.len(), "change emitted");
        follow_ups.mutations
    }

    pub fn end_cycle(&mut self) {
        self.updating = false;
        if self.deferred {
            self.deferred = false;
            self.deadline = Some(self.clock.now() + self.debounce);
        }
    }

    /// Most recent serialization
    pub fn cached_value(&self) -> &str {
        &self.cached
    }

    pub fn last_emitted(&self) -> Option<&str> {
        self.last_emitted.as_deref()
    }

    pub fn stats(&self) -> &ChangeNotifierStats {
        &self.stats
    }
}

struct StrayNullFinder<'a> {
    restored_ids: &'a HashSet<String>,
    found: Vec<String>,
}

impl<'a> Visitor for StrayNullFinder<'a> {
    fn visit_placeholder(&mut self, node: &PlaceholderNode) {
        if self.restored_ids.contains(&node.id) && node.raw_value.is_unset() && !node.is_restored {
            self.found.push(node.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::RefCell;

    fn notifier() -> (Rc<ManualClock>, ChangeNotifier) {
        let clock = Rc::new(ManualClock::new());
        let notifier = ChangeNotifier::new(clock.clone(), Duration::from_millis(DEFAULT_DEBOUNCE_MS));
        (clock, notifier)
    }

    #[test]
    fn test_schedule_resets_deadline() {
        let (clock, mut notifier) = notifier();
        notifier.schedule();
        clock.advance_ms(60);
        notifier.schedule();
        clock.advance_ms(60);
        assert!(!notifier.is_due());
        clock.advance_ms(40);
        assert!(notifier.is_due());
    }

    #[test]
    fn test_schedule_during_restore_ignored() {
        let (_clock, mut notifier) = notifier();
        notifier.begin_restore();
        notifier.schedule();
        assert!(!notifier.is_pending());
    }

    #[test]
    fn test_deferred_schedule_after_cycle() {
        let (_clock, mut notifier) = notifier();
        notifier.begin_cycle();
        notifier.schedule();
        assert!(!notifier.is_pending());
        notifier.end_cycle();
        assert!(notifier.is_pending());
        assert_eq!(notifier.stats().deferred, 1);
    }

    #[test]
    fn test_emit_suppresses_equal_values() {
        let (_clock, mut notifier) = notifier();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        notifier.add_listener(move |event, _| sink.borrow_mut().push(event.value.clone()));

        notifier.emit("a".into(), 1);
        notifier.emit("a".into(), 2);
        notifier.emit("b".into(), 3);

        assert_eq!(*seen.borrow(), vec!["a", "b"]);
        assert_eq!(notifier.stats().suppressed, 1);
    }

    #[test]
    fn test_restore_updates_cache_without_emitting() {
        let (_clock, mut notifier) = notifier();
        let doc = Document::new();

        notifier.begin_restore();
        assert!(notifier.is_restoring());
        notifier.finish_restore("loaded", &doc, "loaded".into());

        assert!(!notifier.is_restoring());
        assert_eq!(notifier.cached_value(), "loaded");
        assert_eq!(notifier.last_emitted(), Some("loaded"));
        assert!(notifier.is_current_load("loaded"));
        assert_eq!(notifier.stats().emitted, 0);

        notifier.schedule();
        assert!(!notifier.is_current_load("loaded"));
    }

    #[test]
    fn test_remove_listener() {
        let (_clock, mut notifier) = notifier();
        let id = notifier.add_listener(|_, _| {});
        let clear_id = notifier.add_clear_listener(|_| {});
        assert_ne!(id, clear_id);
        assert!(notifier.remove_listener(id));
        assert!(!notifier.remove_listener(id));
        assert!(notifier.remove_listener(clear_id));
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_notify_cleared_is_immediate() {
        let (_clock, mut notifier) = notifier();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        notifier.add_clear_listener(move |event| sink.borrow_mut().push(event.version));

        notifier.notify_cleared(7);
        assert_eq!(*seen.borrow(), vec![7]);
        assert!(!notifier.is_pending());
        assert_eq!(notifier.stats().emitted, 0);
    }
}
