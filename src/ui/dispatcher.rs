//! Focus-stack event dispatcher.
//!
//! The dispatcher owns a LIFO stack of [`HandlerTable`]s and a bounded FIFO of
//! decoded events. Only the top table (the focused surface) ever sees input.
//!
//! # Routing
//!
//! 1. Incoming events are appended to the FIFO; on overflow the oldest are
//!    evicted.
//! 2. At most `max(incoming, quota)` buffered events are processed per call;
//!    the rest wait for the next call.
//! 3. `Key(Escape)` followed by a printable event is consumed as one Alt chord
//!    when the focused table traps ESC and swallows printables after it.
//! 4. If the stack changes while a handler runs (self-dismissal), the rest of
//!    the window stays buffered and reaches the new top on the next call.
//!
//! # Example
//!
//! ```ignore
//! let mut dispatcher = Dispatcher::new();
//! let focus = dispatcher.push_focus_with(|focus| {
//!     HandlerTable::builder()
//!         .on(ControlKey::Escape, move || { focus.dismiss(); true })
//!         .build()
//! });
//! dispatcher.handle(decoder.feed(&chunk)?);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use super::handler::HandlerTable;
use crate::core::{ControlKey, Input};

/// Maximum number of buffered events
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;
/// Minimum number of events processed per `handle` call
pub const DEFAULT_BATCH_QUOTA: usize = 16;

struct FocusEntry {
    id: u64,
    table: Rc<HandlerTable>,
    popped: Rc<Cell<bool>>,
}

#[derive(Default)]
struct FocusStack {
    entries: Vec<FocusEntry>,
    next_id: u64,
    /// Bumped on every pop so `handle` can detect self-dismissal
    generation: u64,
}

impl FocusStack {
    fn remove(&mut self, id: u64) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(pos) => {
                let entry = self.entries.remove(pos);
                entry.popped.set(true);
                self.generation += 1;
                true
            }
            None => false,
        }
    }
}

/// Capability to dismiss one focus entry.
///
/// Handed to the surface that pushed the entry; cloning it lets several
/// handler closures share it. Dismissal is idempotent.
#[derive(Clone)]
pub struct FocusHandle {
    id: u64,
    stack: Weak<RefCell<FocusStack>>,
    popped: Rc<Cell<bool>>,
}

impl FocusHandle {
    /// Remove this entry from the focus stack.
    ///
    /// Safe to call from inside a handler while the dispatcher is routing.
    /// Returns `false` if the entry was already gone.
    pub fn dismiss(&self) -> bool {
        if self.popped.replace(true) {
            return false;
        }
        let Some(stack) = self.stack.upgrade() else {
            return false;
        };
        let removed = stack.borrow_mut().remove(self.id);
        if removed {
            tracing::debug!(id = self.id, "focus dismissed");
        }
        removed
    }

    pub fn is_dismissed(&self) -> bool {
        self.popped.get()
    }
}

impl std::fmt::Debug for FocusHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusHandle")
            .field("id", &self.id)
            .field("popped", &self.popped.get())
            .finish()
    }
}

/// Routes decoded events to the focused surface.
///
/// Single-threaded: handlers run synchronously inside [`Dispatcher::handle`]
/// and must not call back into it.
pub struct Dispatcher {
    stack: Rc<RefCell<FocusStack>>,
    queue: VecDeque<Input>,
    capacity: usize,
    quota: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_QUEUE_CAPACITY, DEFAULT_BATCH_QUOTA)
    }

    /// Create a dispatcher with a custom FIFO capacity and per-call quota.
    pub fn with_limits(capacity: usize, quota: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stack: Rc::new(RefCell::new(FocusStack::default())),
            queue: VecDeque::with_capacity(capacity),
            capacity,
            quota: quota.max(1),
        }
    }

    /// Push a table and make it the focused entry.
    pub fn push_focus(&mut self, table: HandlerTable) -> FocusHandle {
        self.push_focus_with(|_| table)
    }

    /// Push a table built with its own [`FocusHandle`], so handlers can
    /// dismiss the surface that owns them.
    pub fn push_focus_with(&mut self, build: impl FnOnce(FocusHandle) -> HandlerTable) -> FocusHandle {
        let id = {
            let mut stack = self.stack.borrow_mut();
            stack.next_id += 1;
            stack.next_id
        };
        let handle = FocusHandle {
            id,
            stack: Rc::downgrade(&self.stack),
            popped: Rc::new(Cell::new(false)),
        };

        let table = build(handle.clone());
        let mut stack = self.stack.borrow_mut();
        stack.entries.push(FocusEntry {
            id,
            table: Rc::new(table),
            popped: handle.popped.clone(),
        });
        tracing::debug!(id, depth = stack.entries.len(), "focus pushed");
        handle
    }

    /// Pop the top entry. No-op on an empty stack.
    pub fn pop_focus(&mut self) {
        let mut stack = self.stack.borrow_mut();
        if let Some(id) = stack.entries.last().map(|entry| entry.id) {
            stack.remove(id);
            tracing::debug!(id, depth = stack.entries.len(), "focus popped");
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().entries.len()
    }

    pub fn has_focus(&self) -> bool {
        self.depth() > 0
    }

    /// Number of buffered events not yet processed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Remove and return every buffered event, oldest first.
    ///
    /// Lets the caller reclaim input left behind when the last surface closed
    /// mid-window, before `handle` would consume it unhandled.
    pub fn take_pending(&mut self) -> Vec<Input> {
        self.queue.drain(..).collect()
    }

    /// Route a batch of events.
    ///
    /// Returns `true` if any event in this call's window was handled, or if a
    /// surface had focus when the call started.
    pub fn handle(&mut self, events: Vec<Input>) -> bool {
        let incoming = events.len();
        self.enqueue(events);

        let had_focus = self.has_focus();
        let window = incoming.max(self.quota).min(self.queue.len());
        let generation = self.stack.borrow().generation;

        let mut handled = false;
        let mut cursor = 0;
        while cursor < window {
            let Some(table) = self.focused() else {
                cursor += 1;
                continue;
            };

            let event = &self.queue[cursor];
            if *event == Input::Key(ControlKey::Escape)
                && table.traps_escape()
                && table.swallows_printable_after_escape()
                && cursor + 1 < window
                && self.queue[cursor + 1].is_printable()
            {
                tracing::trace!("ESC chord swallowed");
                handled = true;
                cursor += 2;
                continue;
            }

            handled |= Self::deliver(&table, event);
            cursor += 1;

            if self.stack.borrow().generation != generation {
                break;
            }
        }

        let consumed = cursor.min(self.queue.len());
        self.queue.drain(..consumed);

        handled || had_focus
    }

    fn enqueue(&mut self, events: Vec<Input>) {
        self.queue.extend(events);
        let overflow = self.queue.len().saturating_sub(self.capacity);
        if overflow > 0 {
            tracing::debug!(overflow, "input queue full, dropping oldest events");
            self.queue.drain(..overflow);
        }
    }

    fn focused(&self) -> Option<Rc<HandlerTable>> {
        self.stack.borrow().entries.last().map(|entry| Rc::clone(&entry.table))
    }

    fn deliver(table: &HandlerTable, event: &Input) -> bool {
        match event {
            Input::Key(_) | Input::Cursor(_) => event
                .control()
                .map_or(false, |control| table.dispatch_control(control)),
            Input::Ascii(_) | Input::Unicode(_) => event
                .payload()
                .map_or(false, |payload| table.dispatch_bytes(payload)),
            Input::Response(response) => table.dispatch_response(response),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("depth", &self.depth())
            .field("pending", &self.queue.len())
            .field("capacity", &self.capacity)
            .field("quota", &self.quota)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CursorKey, Response};

    type Log = Rc<RefCell<Vec<String>>>;

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    /// Table that records every byte payload it receives.
    fn recorder(log: &Log, name: &'static str) -> HandlerTable {
        let log = log.clone();
        HandlerTable::builder()
            .on_bytes(move |payload| {
                log.borrow_mut()
                    .push(format!("{name}:{}", String::from_utf8_lossy(payload)));
                true
            })
            .build()
    }

    /// Table whose ESC handler dismisses itself.
    fn dismissable(dispatcher: &mut Dispatcher, log: &Log, swallow: bool) -> FocusHandle {
        let log = log.clone();
        dispatcher.push_focus_with(move |focus| {
            let bytes_log = log.clone();
            HandlerTable::builder()
                .on(ControlKey::Escape, move || {
                    log.borrow_mut().push("esc".to_string());
                    focus.dismiss();
                    true
                })
                .on_bytes(move |payload| {
                    bytes_log
                        .borrow_mut()
                        .push(format!("modal:{}", String::from_utf8_lossy(payload)));
                    true
                })
                .swallow_printable_after_escape(swallow)
                .build()
        })
    }

    fn esc_chord() -> Vec<Input> {
        vec![Input::Key(ControlKey::Escape), Input::Ascii(b'x')]
    }

    #[test]
    fn test_esc_chord_is_swallowed() {
        let log = new_log();
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_focus(recorder(&log, "base"));
        let modal = dismissable(&mut dispatcher, &log, true);

        assert!(dispatcher.handle(esc_chord()));
        assert!(log.borrow().is_empty());
        assert_eq!(dispatcher.pending(), 0);
        assert!(!modal.is_dismissed());
        assert_eq!(dispatcher.depth(), 2);
    }

    #[test]
    fn test_bare_esc_leaves_printable_for_next_focus() {
        let log = new_log();
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_focus(recorder(&log, "base"));
        let modal = dismissable(&mut dispatcher, &log, false);

        assert!(dispatcher.handle(esc_chord()));
        assert!(modal.is_dismissed());
        assert_eq!(*log.borrow(), vec!["esc"]);
        assert_eq!(dispatcher.pending(), 1);

        assert!(dispatcher.handle(Vec::new()));
        assert_eq!(*log.borrow(), vec!["esc", "base:x"]);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_bare_esc_without_lower_focus() {
        let log = new_log();
        let mut dispatcher = Dispatcher::new();
        dismissable(&mut dispatcher, &log, false);

        assert!(dispatcher.handle(esc_chord()));
        assert!(!dispatcher.has_focus());
        assert!(!dispatcher.handle(Vec::new()));
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(*log.borrow(), vec!["esc"]);
    }

    #[test]
    fn test_esc_without_following_printable_runs_handler() {
        let log = new_log();
        let mut dispatcher = Dispatcher::new();
        dismissable(&mut dispatcher, &log, true);

        assert!(dispatcher.handle(vec![
            Input::Key(ControlKey::Escape),
            Input::Cursor(CursorKey::Up),
        ]));
        assert_eq!(*log.borrow(), vec!["esc"]);
        assert_eq!(dispatcher.pending(), 1);
    }

    #[test]
    fn test_fifo_keeps_most_recent_events() {
        let log = new_log();
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_focus(recorder(&log, "r"));

        let events: Vec<Input> = (0..40u8).map(|i| Input::Ascii(b'0' + i)).collect();
        assert!(dispatcher.handle(events));

        let expected: Vec<String> = (8..40u8)
            .map(|i| format!("r:{}", (b'0' + i) as char))
            .collect();
        assert_eq!(*log.borrow(), expected);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_per_call_quota_drains_backlog() {
        let log = new_log();
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_focus(recorder(&log, "base"));
        dismissable(&mut dispatcher, &log, false);

        let mut events = vec![Input::Key(ControlKey::Escape)];
        events.extend((0..20u8).map(|i| Input::Ascii(b'a' + i)));
        assert!(dispatcher.handle(events));
        assert_eq!(dispatcher.pending(), 20);

        assert!(dispatcher.handle(Vec::new()));
        assert_eq!(dispatcher.pending(), 4);
        assert_eq!(log.borrow().len(), 1 + 16);

        assert!(dispatcher.handle(Vec::new()));
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(log.borrow().len(), 1 + 20);
    }

    #[test]
    fn test_only_top_entry_receives_input() {
        let log = new_log();
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_focus(recorder(&log, "bottom"));
        dispatcher.push_focus(recorder(&log, "top"));

        assert!(dispatcher.handle(vec![Input::Ascii(b'k')]));
        assert_eq!(*log.borrow(), vec!["top:k"]);
    }

    #[test]
    fn test_focused_entry_claims_unhandled_input() {
        let mut dispatcher = Dispatcher::new();
        assert!(!dispatcher.handle(vec![Input::Ascii(b'a')]));

        dispatcher.push_focus(HandlerTable::builder().build());
        assert!(dispatcher.handle(vec![Input::Ascii(b'a')]));
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_routes_by_event_kind() {
        let log = new_log();
        let (cursor_log, response_log, global_log) = (log.clone(), log.clone(), log.clone());
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_focus(
            HandlerTable::builder()
                .on(CursorKey::Down, move || {
                    cursor_log.borrow_mut().push("down".to_string());
                    true
                })
                .global(ControlKey::Etx, move || {
                    global_log.borrow_mut().push("etx".to_string());
                    true
                })
                .on_response(move |response| {
                    response_log.borrow_mut().push(format!("{response:?}"));
                    true
                })
                .build(),
        );

        dispatcher.handle(vec![
            Input::Cursor(CursorKey::Down),
            Input::Key(ControlKey::Etx),
            Input::Response(Response::CursorPosition { row: 3, column: 4 }),
        ]);
        assert_eq!(
            *log.borrow(),
            vec!["down", "etx", "CursorPosition { row: 3, column: 4 }"]
        );
    }

    #[test]
    fn test_take_pending_after_dismissal() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_focus_with(|focus| {
            HandlerTable::builder()
                .on(ControlKey::Return, move || {
                    focus.dismiss();
                    true
                })
                .build()
        });

        assert!(dispatcher.handle(vec![
            Input::Key(ControlKey::Return),
            Input::Ascii(b'm'),
            Input::Ascii(b'n'),
        ]));
        assert!(!dispatcher.has_focus());
        assert_eq!(dispatcher.pending(), 2);

        assert_eq!(dispatcher.take_pending(), vec![Input::Ascii(b'm'), Input::Ascii(b'n')]);
        assert_eq!(dispatcher.pending(), 0);
        assert!(!dispatcher.handle(Vec::new()));
    }

    #[test]
    fn test_pop_focus_on_empty_stack() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.pop_focus();
        assert_eq!(dispatcher.depth(), 0);

        let handle = dispatcher.push_focus(HandlerTable::builder().build());
        dispatcher.pop_focus();
        dispatcher.pop_focus();
        assert!(handle.is_dismissed());
        assert!(!handle.dismiss());
    }

    #[test]
    fn test_dismiss_is_idempotent_and_targeted() {
        let mut dispatcher = Dispatcher::new();
        let bottom = dispatcher.push_focus(HandlerTable::builder().build());
        let top = dispatcher.push_focus(HandlerTable::builder().build());

        assert!(bottom.dismiss());
        assert!(!bottom.dismiss());
        assert_eq!(dispatcher.depth(), 1);
        assert!(!top.is_dismissed());

        assert!(top.dismiss());
        assert!(!dispatcher.has_focus());
    }
}
