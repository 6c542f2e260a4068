//! Handler tables
//!
//! A [`HandlerTable`] declares which inputs one modal surface traps. It is
//! built once, handed to the dispatcher, and never mutated afterwards. Handlers
//! return `true` when they consumed the input; any state they touch lives in
//! the surface and is captured explicitly by the closure.

use std::collections::HashMap;
use std::fmt;

use crate::core::{Control, ControlKey, Response};

/// Zero-argument handler for a trapped control or cursor key.
pub type ControlHandler = Box<dyn Fn() -> bool>;
/// Handler for raw `Ascii`/`Unicode` payloads.
pub type BytesHandler = Box<dyn Fn(&[u8]) -> bool>;
/// Handler for terminal query responses.
pub type ResponseHandler = Box<dyn Fn(&Response) -> bool>;

pub struct HandlerTable {
    control: HashMap<Control, ControlHandler>,
    global: HashMap<Control, ControlHandler>,
    bytes: Option<BytesHandler>,
    responses: Option<ResponseHandler>,
    swallow_printable_after_escape: bool,
}

impl HandlerTable {
    pub fn builder() -> HandlerTableBuilder {
        HandlerTableBuilder::default()
    }

    /// Run the handler for a control input.
    ///
    /// `global` is consulted only when `control` has no entry for the input,
    /// even if the `control` handler declines.
    pub fn dispatch_control(&self, control: Control) -> bool {
        match self.control.get(&control).or_else(|| self.global.get(&control)) {
            Some(handler) => handler(),
            None => false,
        }
    }

    pub fn dispatch_bytes(&self, payload: &[u8]) -> bool {
        self.bytes.as_ref().map_or(false, |handler| handler(payload))
    }

    pub fn dispatch_response(&self, response: &Response) -> bool {
        self.responses.as_ref().map_or(false, |handler| handler(response))
    }

    /// Whether `Key(Escape)` is trapped by either map.
    pub fn traps_escape(&self) -> bool {
        let escape = Control::Key(ControlKey::Escape);
        self.control.contains_key(&escape) || self.global.contains_key(&escape)
    }

    pub fn swallows_printable_after_escape(&self) -> bool {
        self.swallow_printable_after_escape
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("control", &self.control.keys().collect::<Vec<_>>())
            .field("global", &self.global.keys().collect::<Vec<_>>())
            .field("bytes", &self.bytes.is_some())
            .field("responses", &self.responses.is_some())
            .field("swallow_printable_after_escape", &self.swallow_printable_after_escape)
            .finish()
    }
}

#[derive(Default)]
pub struct HandlerTableBuilder {
    control: HashMap<Control, ControlHandler>,
    global: HashMap<Control, ControlHandler>,
    bytes: Option<BytesHandler>,
    responses: Option<ResponseHandler>,
    swallow_printable_after_escape: bool,
}

impl HandlerTableBuilder {
    /// Trap a key or cursor input while this surface is focused.
    pub fn on(mut self, control: impl Into<Control>, handler: impl Fn() -> bool + 'static) -> Self {
        self.control.insert(control.into(), Box::new(handler));
        self
    }

    /// Fallback consulted only when `on` does not trap the input.
    pub fn global(mut self, control: impl Into<Control>, handler: impl Fn() -> bool + 'static) -> Self {
        self.global.insert(control.into(), Box::new(handler));
        self
    }

    pub fn on_bytes(mut self, handler: impl Fn(&[u8]) -> bool + 'static) -> Self {
        self.bytes = Some(Box::new(handler));
        self
    }

    pub fn on_response(mut self, handler: impl Fn(&Response) -> bool + 'static) -> Self {
        self.responses = Some(Box::new(handler));
        self
    }

    /// Claim the printable event that directly follows a trapped ESC.
    pub fn swallow_printable_after_escape(mut self, swallow: bool) -> Self {
        self.swallow_printable_after_escape = swallow;
        self
    }

    pub fn build(self) -> HandlerTable {
        HandlerTable {
            control: self.control,
            global: self.global,
            bytes: self.bytes,
            responses: self.responses,
            swallow_printable_after_escape: self.swallow_printable_after_escape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CursorKey;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_control_takes_precedence_over_global() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (log.clone(), log.clone());
        let table = HandlerTable::builder()
            .on(CursorKey::Left, move || {
                a.borrow_mut().push("control");
                true
            })
            .global(CursorKey::Left, move || {
                b.borrow_mut().push("global");
                true
            })
            .build();

        assert!(table.dispatch_control(CursorKey::Left.into()));
        assert_eq!(*log.borrow(), vec!["control"]);
    }

    #[test]
    fn test_global_is_fallback_only() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (log.clone(), log.clone());
        let table = HandlerTable::builder()
            .on(ControlKey::Tab, move || {
                a.borrow_mut().push("control");
                false
            })
            .global(ControlKey::Tab, move || {
                b.borrow_mut().push("global");
                true
            })
            .global(ControlKey::Etx, || true)
            .build();

        assert!(!table.dispatch_control(ControlKey::Tab.into()));
        assert_eq!(*log.borrow(), vec!["control"]);
        assert!(table.dispatch_control(ControlKey::Etx.into()));
        assert!(!table.dispatch_control(ControlKey::Return.into()));
    }

    #[test]
    fn test_bytes_and_responses() {
        let table = HandlerTable::builder()
            .on_bytes(|payload| payload == b"y")
            .build();
        assert!(table.dispatch_bytes(b"y"));
        assert!(!table.dispatch_bytes(b"n"));
        assert!(!table.dispatch_response(&Response::CursorPosition { row: 1, column: 1 }));
        assert!(!table.traps_escape());
    }

    #[test]
    fn test_traps_escape_from_either_map() {
        let table = HandlerTable::builder().global(ControlKey::Escape, || true).build();
        assert!(table.traps_escape());
        assert!(!table.swallows_printable_after_escape());
    }
}
