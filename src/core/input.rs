//! Typed input events produced by the stream decoder.
//!
//! Every event corresponds to a fully received byte span. Printable payloads are
//! carried as raw bytes rather than `char`/`String` because terminal input is not
//! guaranteed to be 7-bit clean.

/// Single-byte C0 control codes plus DEL.
///
/// The discriminant of each variant is the byte it was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ControlKey {
    Nul = 0x00,
    Soh = 0x01,
    Stx = 0x02,
    /// Ctrl+C
    Etx = 0x03,
    Eot = 0x04,
    Enq = 0x05,
    Ack = 0x06,
    Bel = 0x07,
    Backspace = 0x08,
    Tab = 0x09,
    LineFeed = 0x0A,
    VerticalTab = 0x0B,
    FormFeed = 0x0C,
    Return = 0x0D,
    ShiftOut = 0x0E,
    ShiftIn = 0x0F,
    Dle = 0x10,
    Dc1 = 0x11,
    Dc2 = 0x12,
    Dc3 = 0x13,
    Dc4 = 0x14,
    Nak = 0x15,
    Syn = 0x16,
    Etb = 0x17,
    Can = 0x18,
    Em = 0x19,
    Sub = 0x1A,
    Escape = 0x1B,
    Fs = 0x1C,
    Gs = 0x1D,
    Rs = 0x1E,
    Us = 0x1F,
    /// Sent by most terminals for the Backspace key
    Delete = 0x7F,
}

impl ControlKey {
    /// Every control key, in byte order.
    pub const ALL: [ControlKey; 33] = [
        ControlKey::Nul,
        ControlKey::Soh,
        ControlKey::Stx,
        ControlKey::Etx,
        ControlKey::Eot,
        ControlKey::Enq,
        ControlKey::Ack,
        ControlKey::Bel,
        ControlKey::Backspace,
        ControlKey::Tab,
        ControlKey::LineFeed,
        ControlKey::VerticalTab,
        ControlKey::FormFeed,
        ControlKey::Return,
        ControlKey::ShiftOut,
        ControlKey::ShiftIn,
        ControlKey::Dle,
        ControlKey::Dc1,
        ControlKey::Dc2,
        ControlKey::Dc3,
        ControlKey::Dc4,
        ControlKey::Nak,
        ControlKey::Syn,
        ControlKey::Etb,
        ControlKey::Can,
        ControlKey::Em,
        ControlKey::Sub,
        ControlKey::Escape,
        ControlKey::Fs,
        ControlKey::Gs,
        ControlKey::Rs,
        ControlKey::Us,
        ControlKey::Delete,
    ];

    /// The wire byte for this key.
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Cursor keys decoded from `ESC [ A|B|C|D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKey {
    Up,
    Down,
    Right,
    Left,
}

/// Replies the terminal sends to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Cursor position report: ESC [ row ; column R (1-based)
    CursorPosition { row: u16, column: u16 },
}

/// A decoded input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// C0 control code or DEL
    Key(ControlKey),
    /// Arrow key
    Cursor(CursorKey),
    /// Query response
    Response(Response),
    /// One 7-bit byte that is not a control code
    Ascii(u8),
    /// A UTF-8 scalar (2-4 bytes) or a coalesced run of plain ASCII
    Unicode(Vec<u8>),
}

impl Input {
    /// The handler-table key for `Key`/`Cursor` events.
    pub fn control(&self) -> Option<Control> {
        match self {
            Input::Key(key) => Some(Control::Key(*key)),
            Input::Cursor(key) => Some(Control::Cursor(*key)),
            _ => None,
        }
    }

    /// Raw bytes of an `Ascii`/`Unicode` event.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Input::Ascii(byte) => Some(std::slice::from_ref(byte)),
            Input::Unicode(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_printable(&self) -> bool {
        matches!(self, Input::Ascii(_) | Input::Unicode(_))
    }
}

/// The subset of inputs a handler table can trap by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Key(ControlKey),
    Cursor(CursorKey),
}

impl From<ControlKey> for Control {
    fn from(key: ControlKey) -> Self {
        Control::Key(key)
    }
}

impl From<CursorKey> for Control {
    fn from(key: CursorKey) -> Self {
        Control::Cursor(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_key_bytes_are_distinct() {
        let mut bytes: Vec<u8> = ControlKey::ALL.iter().map(|k| k.byte()).collect();
        bytes.dedup();
        assert_eq!(bytes.len(), 33);
        assert_eq!(ControlKey::Escape.byte(), 0x1B);
        assert_eq!(ControlKey::Delete.byte(), 0x7F);
    }

    #[test]
    fn test_payload_and_control() {
        assert_eq!(Input::Ascii(b'q').payload(), Some(&b"q"[..]));
        assert_eq!(Input::Unicode(b"ab".to_vec()).payload(), Some(&b"ab"[..]));
        assert_eq!(Input::Key(ControlKey::Tab).payload(), None);

        assert_eq!(
            Input::Cursor(CursorKey::Up).control(),
            Some(Control::Cursor(CursorKey::Up))
        );
        assert_eq!(Input::Ascii(b'x').control(), None);
        assert!(Input::Ascii(b'x').is_printable());
        assert!(!Input::Key(ControlKey::Escape).is_printable());
    }
}
