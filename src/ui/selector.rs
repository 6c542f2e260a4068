//! Selection list surface.
//!
//! A filterable list (snippets, history, ...) that takes focus while visible.
//! Typed text narrows the results, ↑/↓ move the selection, 1-9 pick by number
//! while the query is empty, Enter confirms and Esc cancels.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::dispatcher::{Dispatcher, FocusHandle};
use super::handler::HandlerTable;
use crate::core::{ControlKey, CursorKey};

/// Number of rows shown at once
const MAX_VISIBLE: usize = 10;

/// Selector state shared between the handler closures and the renderer.
#[derive(Debug)]
pub struct SelectorState {
    /// All entries (newest last)
    entries: Vec<String>,
    /// Current search query
    pub query: String,
    /// Filtered results
    pub results: Vec<String>,
    /// Currently selected index
    pub selected: usize,
    pub visible: bool,
    pub scroll_offset: usize,
    pub max_visible: usize,
    focus: Option<FocusHandle>,
}

impl SelectorState {
    fn new(entries: Vec<String>) -> Self {
        let mut state = Self {
            entries,
            query: String::new(),
            results: Vec::new(),
            selected: 0,
            visible: false,
            scroll_offset: 0,
            max_visible: MAX_VISIBLE,
            focus: None,
        };
        state.update_results();
        state
    }

    /// Recompute results from the query: newest first, case-insensitive,
    /// without duplicates.
    pub fn update_results(&mut self) {
        let query = self.query.to_lowercase();
        let mut seen = HashSet::new();
        self.results = self
            .entries
            .iter()
            .rev()
            .filter(|entry| query.is_empty() || entry.to_lowercase().contains(&query))
            .filter(|entry| seen.insert(entry.as_str()))
            .cloned()
            .collect();

        if self.selected >= self.results.len() && !self.results.is_empty() {
            self.selected = self.results.len() - 1;
        }
        if self.results.is_empty() {
            self.selected = 0;
        }
        self.adjust_scroll();
    }

    pub fn input_str(&mut self, text: &str) {
        self.query.push_str(text);
        self.selected = 0;
        self.scroll_offset = 0;
        self.update_results();
    }

    pub fn backspace(&mut self) {
        self.query.pop();
        self.update_results();
    }

    pub fn select_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.adjust_scroll();
        }
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.results.len() {
            self.selected += 1;
            self.adjust_scroll();
        }
    }

    fn adjust_scroll(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.max_visible {
            self.scroll_offset = self.selected - self.max_visible + 1;
        }
    }

    /// Visible rows for rendering: (display_index, entry, is_selected)
    pub fn visible_items(&self) -> Vec<(usize, &str, bool)> {
        self.results
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.max_visible)
            .map(|(idx, entry)| (idx - self.scroll_offset, entry.as_str(), idx == self.selected))
            .collect()
    }

    fn hide(&mut self) {
        self.visible = false;
        if let Some(focus) = self.focus.take() {
            focus.dismiss();
        }
    }
}

/// Selection list surface.
pub struct Selector {
    state: Rc<RefCell<SelectorState>>,
    on_pick: Rc<dyn Fn(Option<String>)>,
}

impl Selector {
    /// Creates a selector over `entries` (oldest first). `on_pick` receives the
    /// confirmed entry, or `None` when the selector is cancelled.
    pub fn new(entries: Vec<String>, on_pick: impl Fn(Option<String>) + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(SelectorState::new(entries))),
            on_pick: Rc::new(on_pick),
        }
    }

    /// Show the selector with an empty query and take focus.
    pub fn show(&self, dispatcher: &mut Dispatcher) {
        {
            let mut state = self.state.borrow_mut();
            if state.visible {
                return;
            }
            state.visible = true;
            state.query.clear();
            state.selected = 0;
            state.scroll_offset = 0;
            state.update_results();
        }

        let focus = dispatcher.push_focus(self.handler_table());
        self.state.borrow_mut().focus = Some(focus);
    }

    pub fn hide(&self) {
        self.state.borrow_mut().hide();
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn state(&self) -> std::cell::Ref<'_, SelectorState> {
        self.state.borrow()
    }

    /// Add an entry (newest last).
    pub fn push_entry(&self, entry: String) {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.entries.last().map(String::as_str) == Some(trimmed) {
            return;
        }
        state.entries.push(trimmed.to_string());
        state.update_results();
    }

    fn handler_table(&self) -> HandlerTable {
        let up = self.state.clone();
        let down = self.state.clone();
        let back = self.state.clone();
        let delete = self.state.clone();
        let bytes = self.state.clone();
        let bytes_pick = self.on_pick.clone();

        HandlerTable::builder()
            .on(CursorKey::Up, move || {
                up.borrow_mut().select_up();
                true
            })
            .on(CursorKey::Down, move || {
                down.borrow_mut().select_down();
                true
            })
            .on(ControlKey::Backspace, move || {
                back.borrow_mut().backspace();
                true
            })
            .on(ControlKey::Delete, move || {
                delete.borrow_mut().backspace();
                true
            })
            .on(ControlKey::Return, self.finish(true))
            .on(ControlKey::Escape, self.finish(false))
            .global(ControlKey::Etx, self.finish(false))
            .on_bytes(move |payload| {
                let Ok(text) = std::str::from_utf8(payload) else {
                    return false;
                };
                let picked = {
                    let mut state = bytes.borrow_mut();
                    match text.as_bytes() {
                        [digit @ b'1'..=b'9'] if state.query.is_empty() => {
                            let index = (digit - b'1') as usize;
                            if index >= state.results.len() {
                                return true;
                            }
                            state.selected = index;
                            let picked = state.results[index].clone();
                            state.hide();
                            picked
                        }
                        _ => {
                            state.input_str(text);
                            return true;
                        }
                    }
                };
                bytes_pick(Some(picked));
                true
            })
            .swallow_printable_after_escape(true)
            .build()
    }

    /// Handler that hides the selector and reports the selection (`confirm`)
    /// or a cancellation.
    fn finish(&self, confirm: bool) -> impl Fn() -> bool + 'static {
        let state = self.state.clone();
        let on_pick = self.on_pick.clone();
        move || {
            let picked = {
                let mut state = state.borrow_mut();
                let picked = if confirm {
                    state.results.get(state.selected).cloned()
                } else {
                    None
                };
                if confirm && picked.is_none() {
                    // Nothing to confirm; stay open
                    return true;
                }
                state.hide();
                picked
            };
            on_pick(picked);
            true
        }
    }
}
