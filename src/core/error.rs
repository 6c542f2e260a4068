//! Decode errors
//!
//! Every error carries the raw bytes of the unit that could not be decoded.

use std::fmt;
use thiserror::Error;

/// Which parser state was abandoned when the stream ended mid-sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Escape,
    Csi,
    Osc,
    Utf8Plain,
    Utf8Meta,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceKind::Escape => "escape",
            SequenceKind::Csi => "csi",
            SequenceKind::Osc => "osc",
            SequenceKind::Utf8Plain => "utf8",
            SequenceKind::Utf8Meta => "utf8 (meta)",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid UTF-8 lead byte: {bytes:02X?}")]
    InvalidLeadByte { bytes: Vec<u8> },

    #[error("Invalid UTF-8 continuation byte: {bytes:02X?}")]
    InvalidContinuationByte { bytes: Vec<u8> },

    #[error("Unhandled control sequence: {bytes:02X?}")]
    UnhandledControlSequence { bytes: Vec<u8> },

    #[error("Unterminated {kind} sequence at end of stream: {bytes:02X?}")]
    UnterminatedSequence { kind: SequenceKind, bytes: Vec<u8> },

    #[error("Decoder was already flushed")]
    Finished,
}

impl DecodeError {
    /// Offending bytes, empty for [`DecodeError::Finished`].
    pub fn bytes(&self) -> &[u8] {
        match self {
            DecodeError::InvalidLeadByte { bytes }
            | DecodeError::InvalidContinuationByte { bytes }
            | DecodeError::UnhandledControlSequence { bytes }
            | DecodeError::UnterminatedSequence { bytes, .. } => bytes,
            DecodeError::Finished => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_shows_hex_bytes() {
        let err = DecodeError::UnterminatedSequence {
            kind: SequenceKind::Csi,
            bytes: vec![0x1B, b'[', b'1'],
        };
        assert_eq!(
            err.to_string(),
            "Unterminated csi sequence at end of stream: [1B, 5B, 31]"
        );
        assert_eq!(err.bytes(), &[0x1B, b'[', b'1']);
    }
}
