//! Context menu surface.
//!
//! A small modal menu that takes focus while visible. It supports keyboard
//! navigation (↑/↓ or j/k), single-key accelerators and Alt chords that are
//! claimed without dismissing the menu.
//!
//! # Example
//!
//! ```ignore
//! let menu = ContextMenu::new(move |action| outbox.borrow_mut().push(action));
//! menu.show(&mut dispatcher, x, y, screen_width, screen_height);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use unicode_width::UnicodeWidthStr;

use super::dispatcher::{Dispatcher, FocusHandle};
use super::handler::HandlerTable;
use crate::core::{ControlKey, CursorKey};

/// Actions that can be triggered from the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuAction {
    /// Open the snippet selector.
    OpenSelector,
    /// Ask the terminal for its cursor position.
    ReportCursor,
    /// Clear the event log.
    ClearLog,
    /// Exit the application.
    Quit,
    /// Close the menu without taking action.
    Cancel,
}

/// A single item in the context menu.
#[derive(Debug, Clone)]
pub struct MenuItem {
    /// Display label for the menu item.
    pub label: &'static str,
    /// Action to execute when selected.
    pub action: ContextMenuAction,
    /// Accelerator key, also shown as a hint.
    pub shortcut: Option<u8>,
}

impl MenuItem {
    pub const fn new(label: &'static str, action: ContextMenuAction, shortcut: Option<u8>) -> Self {
        Self { label, action, shortcut }
    }
}

/// Menu state shared between the handler closures and the renderer.
#[derive(Debug)]
pub struct MenuState {
    /// Whether the menu is currently visible.
    pub visible: bool,
    /// X position of the menu (screen coordinates).
    pub x: u16,
    /// Y position of the menu (screen coordinates).
    pub y: u16,
    /// Index of the currently selected/highlighted item.
    pub selected: usize,
    pub items: Vec<MenuItem>,
    focus: Option<FocusHandle>,
}

impl MenuState {
    /// Move selection up
    pub fn up(&mut self) {
        self.selected = match self.selected.checked_sub(1) {
            Some(prev) => prev,
            None => self.items.len().saturating_sub(1),
        };
    }

    /// Move selection down
    pub fn down(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        } else {
            self.selected = 0;
        }
    }

    pub fn selected_action(&self) -> Option<ContextMenuAction> {
        self.items.get(self.selected).map(|item| item.action)
    }

    fn accelerator(&self, key: u8) -> Option<ContextMenuAction> {
        self.items
            .iter()
            .find(|item| item.shortcut == Some(key))
            .map(|item| item.action)
    }

    /// Menu content width (excluding borders)
    pub fn content_width(&self) -> u16 {
        self.items
            .iter()
            .map(|item| {
                let shortcut_len = if item.shortcut.is_some() { 4 } else { 0 }; // " (x)"
                item.label.width() + shortcut_len + 2 // " label (x) "
            })
            .max()
            .unwrap_or(18) as u16
    }

    /// Menu dimensions (including borders)
    pub fn dimensions(&self) -> (u16, u16) {
        let width = self.content_width() + 2;
        let height = self.items.len() as u16 + 2;
        (width, height)
    }

    fn hide(&mut self) {
        self.visible = false;
        if let Some(focus) = self.focus.take() {
            focus.dismiss();
        }
    }
}

/// Context menu surface.
pub struct ContextMenu {
    state: Rc<RefCell<MenuState>>,
    on_action: Rc<dyn Fn(ContextMenuAction)>,
}

impl ContextMenu {
    /// Creates a menu that reports the chosen action through `on_action`.
    ///
    /// The default items are:
    /// - Snippets (s)
    /// - Cursor position (p)
    /// - Clear log (c)
    /// - Quit (q)
    /// - Cancel
    pub fn new(on_action: impl Fn(ContextMenuAction) + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(MenuState {
                visible: false,
                x: 0,
                y: 0,
                selected: 0,
                items: vec![
                    MenuItem::new("Snippets", ContextMenuAction::OpenSelector, Some(b's')),
                    MenuItem::new("Cursor position", ContextMenuAction::ReportCursor, Some(b'p')),
                    MenuItem::new("Clear log", ContextMenuAction::ClearLog, Some(b'c')),
                    MenuItem::new("Quit", ContextMenuAction::Quit, Some(b'q')),
                    MenuItem::new("Cancel", ContextMenuAction::Cancel, None),
                ],
                focus: None,
            })),
            on_action: Rc::new(on_action),
        }
    }

    /// Show the menu and take focus.
    ///
    /// The position is clamped so the menu stays on screen.
    pub fn show(&self, dispatcher: &mut Dispatcher, x: u16, y: u16, screen_width: u16, screen_height: u16) {
        {
            let mut state = self.state.borrow_mut();
            if state.visible {
                return;
            }
            state.visible = true;
            state.selected = 0;

            let (width, height) = state.dimensions();
            state.x = x.min(screen_width.saturating_sub(width));
            state.y = y.min(screen_height.saturating_sub(height));
        }

        let focus = dispatcher.push_focus(self.handler_table());
        self.state.borrow_mut().focus = Some(focus);
    }

    /// Hide the menu, giving focus back.
    pub fn hide(&self) {
        self.state.borrow_mut().hide();
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn state(&self) -> std::cell::Ref<'_, MenuState> {
        self.state.borrow()
    }

    fn handler_table(&self) -> HandlerTable {
        let up = self.state.clone();
        let down = self.state.clone();
        let bytes = self.state.clone();
        let bytes_action = self.on_action.clone();

        HandlerTable::builder()
            .on(CursorKey::Up, move || {
                up.borrow_mut().up();
                true
            })
            .on(CursorKey::Down, move || {
                down.borrow_mut().down();
                true
            })
            .on(ControlKey::Return, self.choose(None))
            .on(ControlKey::Escape, self.choose(Some(ContextMenuAction::Cancel)))
            .global(ControlKey::Etx, self.choose(Some(ContextMenuAction::Cancel)))
            .on_bytes(move |payload| {
                let [key] = payload else {
                    return false;
                };
                let action = {
                    let mut state = bytes.borrow_mut();
                    match *key {
                        b'k' => {
                            state.up();
                            return true;
                        }
                        b'j' => {
                            state.down();
                            return true;
                        }
                        _ => match state.accelerator(*key) {
                            Some(action) => {
                                state.hide();
                                action
                            }
                            None => return false,
                        },
                    }
                };
                bytes_action(action);
                true
            })
            .swallow_printable_after_escape(true)
            .build()
    }

    /// Handler that hides the menu and reports `action`, or the highlighted
    /// item when `action` is `None`.
    fn choose(&self, action: Option<ContextMenuAction>) -> impl Fn() -> bool + 'static {
        let state = self.state.clone();
        let on_action = self.on_action.clone();
        move || {
            let action = {
                let mut state = state.borrow_mut();
                let action = action
                    .or_else(|| state.selected_action())
                    .unwrap_or(ContextMenuAction::Cancel);
                state.hide();
                action
            };
            on_action(action);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Input;

    fn menu_with_outbox() -> (ContextMenu, Rc<RefCell<Vec<ContextMenuAction>>>) {
        let outbox = Rc::new(RefCell::new(Vec::new()));
        let sink = outbox.clone();
        let menu = ContextMenu::new(move |action| sink.borrow_mut().push(action));
        (menu, outbox)
    }

    #[test]
    fn test_navigation_wraps() {
        let (menu, outbox) = menu_with_outbox();
        let mut dispatcher = Dispatcher::new();
        menu.show(&mut dispatcher, 0, 0, 80, 24);

        dispatcher.handle(vec![Input::Cursor(CursorKey::Up)]);
        assert_eq!(menu.state().selected, 4);
        dispatcher.handle(vec![Input::Cursor(CursorKey::Down), Input::Ascii(b'j')]);
        assert_eq!(menu.state().selected, 1);

        dispatcher.handle(vec![Input::Key(ControlKey::Return)]);
        assert_eq!(*outbox.borrow(), vec![ContextMenuAction::ReportCursor]);
        assert!(!menu.is_visible());
        assert!(!dispatcher.has_focus());
    }

    #[test]
    fn test_accelerator_selects_item() {
        let (menu, outbox) = menu_with_outbox();
        let mut dispatcher = Dispatcher::new();
        menu.show(&mut dispatcher, 0, 0, 80, 24);

        assert!(dispatcher.handle(vec![Input::Ascii(b'c')]));
        assert_eq!(*outbox.borrow(), vec![ContextMenuAction::ClearLog]);
        assert!(!dispatcher.has_focus());
    }

    #[test]
    fn test_alt_chord_does_not_dismiss() {
        let (menu, outbox) = menu_with_outbox();
        let mut dispatcher = Dispatcher::new();
        menu.show(&mut dispatcher, 0, 0, 80, 24);

        assert!(dispatcher.handle(vec![Input::Key(ControlKey::Escape), Input::Ascii(b'q')]));
        assert!(outbox.borrow().is_empty());
        assert!(menu.is_visible());

        dispatcher.handle(vec![Input::Key(ControlKey::Escape)]);
        assert_eq!(*outbox.borrow(), vec![ContextMenuAction::Cancel]);
        assert!(!menu.is_visible());
    }

    #[test]
    fn test_text_runs_are_ignored() {
        let (menu, outbox) = menu_with_outbox();
        let mut dispatcher = Dispatcher::new();
        menu.show(&mut dispatcher, 0, 0, 80, 24);

        // Focused surfaces still claim the batch
        assert!(dispatcher.handle(vec![Input::Unicode(b"qq".to_vec())]));
        assert!(outbox.borrow().is_empty());
        assert!(menu.is_visible());
    }

    #[test]
    fn test_show_clamps_to_screen() {
        let (menu, _) = menu_with_outbox();
        let mut dispatcher = Dispatcher::new();
        menu.show(&mut dispatcher, 79, 23, 80, 24);

        let state = menu.state();
        let (width, height) = state.dimensions();
        assert_eq!(state.x, 80 - width);
        assert_eq!(state.y, 24 - height);
    }

    #[test]
    fn test_empty_menu_navigation_and_confirm() {
        let (menu, outbox) = menu_with_outbox();
        menu.state.borrow_mut().items.clear();
        let mut dispatcher = Dispatcher::new();
        menu.show(&mut dispatcher, 0, 0, 80, 24);

        dispatcher.handle(vec![Input::Cursor(CursorKey::Up), Input::Cursor(CursorKey::Down)]);
        assert_eq!(menu.state().selected, 0);
        assert_eq!(menu.state().selected_action(), None);

        dispatcher.handle(vec![Input::Key(ControlKey::Return)]);
        assert_eq!(*outbox.borrow(), vec![ContextMenuAction::Cancel]);
        assert!(!menu.is_visible());
    }

    #[test]
    fn test_show_twice_pushes_once() {
        let (menu, _) = menu_with_outbox();
        let mut dispatcher = Dispatcher::new();
        menu.show(&mut dispatcher, 0, 0, 80, 24);
        menu.show(&mut dispatcher, 0, 0, 80, 24);
        assert_eq!(dispatcher.depth(), 1);

        menu.hide();
        menu.hide();
        assert_eq!(dispatcher.depth(), 0);
    }
}
