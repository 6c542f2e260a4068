//! Streaming input decoder
//!
//! Turns an arbitrarily fragmented byte stream from the terminal into typed
//! [`Input`] events. Parse state survives across [`StreamDecoder::feed`] calls,
//! so feeding a stream in any number of chunks yields the same events as
//! feeding it at once.
//!
//! ```text
//! Ground ──ESC──> Escape ──[──> Csi ──final──> Ground
//!   │               ├──]/P──> Osc ──BEL / ESC \──> (unhandled)
//!   │               ├──printable──> Ground   (emits ESC + Ascii)
//!   │               └──lead──> Utf8(Meta) ──> Ground
//!   └──lead──> Utf8(Plain) ──> Ground
//! ```

use super::classify;
use super::error::{DecodeError, Result, SequenceKind};
use super::input::{ControlKey, Input, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OscTerminator {
    /// BEL (0x07)
    Bel,
    /// ST (ESC \)
    St,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Utf8Context {
    Plain,
    /// Scalar following an ESC (Alt/Option chord)
    Meta,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    Csi,
    Osc {
        terminator: OscTerminator,
        saw_escape: bool,
    },
    Utf8 {
        context: Utf8Context,
        remaining: u8,
    },
}

/// Byte-level decoder state machine.
///
/// Owned by exactly one input pipeline; there is no internal locking.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    state: ParserState,
    /// Raw bytes of the in-flight control sequence
    escape_buffer: Vec<u8>,
    /// Bytes of the in-flight UTF-8 scalar
    unicode_buffer: Vec<u8>,
    /// Coalesced plain-ASCII run pending emission
    text_buffer: Vec<u8>,
    finished: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            state: ParserState::Ground,
            escape_buffer: Vec::with_capacity(16),
            unicode_buffer: Vec::with_capacity(4),
            text_buffer: Vec::with_capacity(64),
            finished: false,
        }
    }

    /// Decode one chunk.
    ///
    /// Plain text stays buffered in `Ground` until the stream leaves `Ground`
    /// for a non-text reason, or until [`flush`](Self::flush) /
    /// [`flush_idle`](Self::flush_idle).
    ///
    /// # Errors
    ///
    /// Fails on the first malformed unit. Events decoded earlier in the same
    /// chunk are discarded with it; the decoder is not resynchronised (see
    /// [`reset`](Self::reset)).
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Input>> {
        if self.finished {
            return Err(DecodeError::Finished);
        }

        let mut events = Vec::new();
        for &byte in chunk {
            self.advance(byte, &mut events)?;
        }
        Ok(events)
    }

    /// Finalize the stream.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnterminatedSequence`] if the stream ended inside a
    /// control or UTF-8 sequence, [`DecodeError::Finished`] if the decoder was
    /// already flushed.
    pub fn flush(&mut self) -> Result<Vec<Input>> {
        if self.finished {
            return Err(DecodeError::Finished);
        }

        let kind = match self.state {
            ParserState::Ground => {
                let mut events = Vec::new();
                self.flush_text(&mut events);
                self.finished = true;
                return Ok(events);
            }
            ParserState::Escape => SequenceKind::Escape,
            ParserState::Csi => SequenceKind::Csi,
            ParserState::Osc { .. } => SequenceKind::Osc,
            ParserState::Utf8 { context: Utf8Context::Plain, .. } => SequenceKind::Utf8Plain,
            ParserState::Utf8 { context: Utf8Context::Meta, .. } => SequenceKind::Utf8Meta,
        };

        let bytes = match kind {
            SequenceKind::Utf8Plain => self.unicode_buffer.clone(),
            _ => self.escape_buffer.clone(),
        };
        Err(DecodeError::UnterminatedSequence { kind, bytes })
    }

    /// Release input held back while the byte source is quiet.
    ///
    /// Emits the pending text run, and a lone ESC as `Key(Escape)`. Any other
    /// partial sequence stays in flight.
    pub fn flush_idle(&mut self) -> Vec<Input> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        match self.state {
            ParserState::Ground => self.flush_text(&mut events),
            ParserState::Escape => {
                tracing::trace!("lone ESC at idle boundary");
                events.push(Input::Key(ControlKey::Escape));
                self.finish_sequence();
            }
            _ => {}
        }
        events
    }

    /// Return to the initial state, dropping anything in flight.
    pub fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.escape_buffer.clear();
        self.unicode_buffer.clear();
        self.text_buffer.clear();
        self.finished = false;
    }

    pub fn is_ground(&self) -> bool {
        self.state == ParserState::Ground
    }

    fn advance(&mut self, byte: u8, out: &mut Vec<Input>) -> Result<()> {
        match self.state {
            ParserState::Ground => self.ground(byte, out),
            ParserState::Escape => self.escape(byte, out),
            ParserState::Csi => self.csi(byte, out),
            ParserState::Osc { terminator, saw_escape } => self.osc(byte, terminator, saw_escape),
            ParserState::Utf8 { context, remaining } => self.utf8(byte, context, remaining, out),
        }
    }

    fn ground(&mut self, byte: u8, out: &mut Vec<Input>) -> Result<()> {
        if byte == ControlKey::Escape.byte() {
            self.flush_text(out);
            self.escape_buffer.clear();
            self.escape_buffer.push(byte);
            self.state = ParserState::Escape;
        } else if let Some(key) = classify::control_key(byte) {
            self.flush_text(out);
            out.push(Input::Key(key));
        } else if byte < 0x80 {
            self.text_buffer.push(byte);
        } else {
            self.flush_text(out);
            self.begin_utf8(byte, Utf8Context::Plain)?;
        }
        Ok(())
    }

    fn escape(&mut self, byte: u8, out: &mut Vec<Input>) -> Result<()> {
        self.escape_buffer.push(byte);

        match byte {
            b'[' => self.state = ParserState::Csi,
            b']' => {
                self.state = ParserState::Osc {
                    terminator: OscTerminator::Bel,
                    saw_escape: false,
                }
            }
            b'P' => {
                self.state = ParserState::Osc {
                    terminator: OscTerminator::St,
                    saw_escape: false,
                }
            }
            _ if classify::is_control(byte) => return Err(self.unhandled()),
            0x00..=0x7F => {
                // Alt/Option chord over a printable byte
                out.push(Input::Key(ControlKey::Escape));
                out.push(Input::Ascii(byte));
                self.finish_sequence();
            }
            _ => {
                self.begin_utf8(byte, Utf8Context::Meta)?;
                out.push(Input::Key(ControlKey::Escape));
            }
        }
        Ok(())
    }

    fn csi(&mut self, byte: u8, out: &mut Vec<Input>) -> Result<()> {
        self.escape_buffer.push(byte);

        if classify::is_csi_final(byte) {
            let event = self.classify_csi()?;
            out.push(event);
            self.finish_sequence();
        }
        Ok(())
    }

    fn classify_csi(&self) -> Result<Input> {
        // Drop the ESC; the arrow table and the decomposition both expect "[..."
        let payload = std::str::from_utf8(&self.escape_buffer[1..]).map_err(|_| self.unhandled())?;

        if let Some(key) = classify::cursor_key(payload) {
            return Ok(Input::Cursor(key));
        }

        let csi = classify::csi_function(payload).ok_or_else(|| self.unhandled())?;
        match csi.function {
            'R' if csi.params.len() >= 2 => {
                let row = csi.params[0].parse::<u16>().map_err(|_| self.unhandled())?;
                let column = csi.params[1].parse::<u16>().map_err(|_| self.unhandled())?;
                Ok(Input::Response(Response::CursorPosition { row, column }))
            }
            function => {
                tracing::debug!(
                    "Unhandled CSI: function={:?}, params={:?}",
                    function,
                    csi.params
                );
                Err(self.unhandled())
            }
        }
    }

    fn osc(&mut self, byte: u8, terminator: OscTerminator, saw_escape: bool) -> Result<()> {
        self.escape_buffer.push(byte);

        match terminator {
            OscTerminator::Bel => {
                if byte == ControlKey::Bel.byte() {
                    return Err(self.unhandled());
                }
            }
            OscTerminator::St => {
                if saw_escape && byte == b'\\' {
                    return Err(self.unhandled());
                }
                self.state = ParserState::Osc {
                    terminator,
                    saw_escape: byte == ControlKey::Escape.byte(),
                };
            }
        }
        Ok(())
    }

    fn utf8(&mut self, byte: u8, context: Utf8Context, remaining: u8, out: &mut Vec<Input>) -> Result<()> {
        if !classify::is_continuation(byte) {
            let mut bytes = match context {
                Utf8Context::Plain => self.unicode_buffer.clone(),
                Utf8Context::Meta => self.escape_buffer.clone(),
            };
            bytes.push(byte);
            return Err(DecodeError::InvalidContinuationByte { bytes });
        }

        self.unicode_buffer.push(byte);
        if context == Utf8Context::Meta {
            self.escape_buffer.push(byte);
        }

        let remaining = remaining - 1;
        if remaining == 0 {
            out.push(Input::Unicode(std::mem::take(&mut self.unicode_buffer)));
            self.finish_sequence();
        } else {
            self.state = ParserState::Utf8 { context, remaining };
        }
        Ok(())
    }

    fn begin_utf8(&mut self, lead: u8, context: Utf8Context) -> Result<()> {
        let Some(remaining) = classify::utf8_continuations(lead) else {
            let bytes = match context {
                Utf8Context::Plain => vec![lead],
                Utf8Context::Meta => self.escape_buffer.clone(),
            };
            return Err(DecodeError::InvalidLeadByte { bytes });
        };

        self.unicode_buffer.clear();
        self.unicode_buffer.push(lead);
        self.state = ParserState::Utf8 { context, remaining };
        Ok(())
    }

    fn flush_text(&mut self, out: &mut Vec<Input>) {
        match self.text_buffer.len() {
            0 => {}
            1 => {
                out.push(Input::Ascii(self.text_buffer[0]));
                self.text_buffer.clear();
            }
            _ => out.push(Input::Unicode(std::mem::take(&mut self.text_buffer))),
        }
    }

    fn finish_sequence(&mut self) {
        self.escape_buffer.clear();
        self.unicode_buffer.clear();
        self.state = ParserState::Ground;
    }

    fn unhandled(&self) -> DecodeError {
        DecodeError::UnhandledControlSequence {
            bytes: self.escape_buffer.clone(),
        }
    }
}
