//! Input decoding core.
//!
//! This module turns raw terminal bytes into typed events:
//!
//! - **input**: event types (`Input`, `ControlKey`, `CursorKey`, `Response`)
//! - **classify**: stateless byte and CSI lookups
//! - **decoder**: streaming escape-sequence / UTF-8 state machine
//! - **error**: decode error taxonomy
//!
//! # Architecture
//!
//! ```text
//! bytes ──> StreamDecoder ──> Vec<Input> ──> ui::Dispatcher
//!               └── classify (control codes, arrows, CSI functions)
//! ```

pub mod classify;
pub mod decoder;
pub mod error;
pub mod input;

pub use decoder::StreamDecoder;
pub use error::{DecodeError, SequenceKind};
pub use input::{Control, ControlKey, CursorKey, Input, Response};
