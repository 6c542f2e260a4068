//! Byte classifier
//!
//! Stateless lookups used by the stream decoder: single-byte control codes,
//! UTF-8 lead bytes, the arrow-key table and CSI function decomposition.

use super::input::{ControlKey, CursorKey};

/// Map a C0 control byte or DEL to its key.
pub fn control_key(byte: u8) -> Option<ControlKey> {
    match byte {
        0x00..=0x1F => Some(ControlKey::ALL[byte as usize]),
        0x7F => Some(ControlKey::Delete),
        _ => None,
    }
}

/// True for bytes in `0x00..=0x1F` and `0x7F`.
pub fn is_control(byte: u8) -> bool {
    control_key(byte).is_some()
}

/// Number of continuation bytes that follow a UTF-8 lead byte.
///
/// Overlong two-byte leads (`0xC0`, `0xC1`) and leads past U+10FFFF
/// (`0xF5..`) are rejected.
pub fn utf8_continuations(lead: u8) -> Option<u8> {
    match lead {
        0xC2..=0xDF => Some(1),
        0xE0..=0xEF => Some(2),
        0xF0..=0xF4 => Some(3),
        _ => None,
    }
}

pub fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Final byte of a CSI sequence.
pub fn is_csi_final(byte: u8) -> bool {
    (0x40..=0x7E).contains(&byte)
}

/// Look up a bracket-inclusive CSI payload (`"[A"`) in the arrow-key table.
pub fn cursor_key(payload: &str) -> Option<CursorKey> {
    match payload {
        "[A" => Some(CursorKey::Up),
        "[B" => Some(CursorKey::Down),
        "[C" => Some(CursorKey::Right),
        "[D" => Some(CursorKey::Left),
        _ => None,
    }
}

/// A CSI payload split into its function character and `;`-separated params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsiFunction<'a> {
    pub function: char,
    pub params: Vec<&'a str>,
}

/// Decompose a bracket-inclusive CSI payload such as `"[12;7R"`.
///
/// Returns `None` when the payload does not start with `[` or has no
/// function character.
pub fn csi_function(payload: &str) -> Option<CsiFunction<'_>> {
    let body = payload.strip_prefix('[')?;
    let function = body.chars().last()?;
    let params = &body[..body.len() - function.len_utf8()];
    Some(CsiFunction {
        function,
        params: params.split(';').collect(),
    })
}
