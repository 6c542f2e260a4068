//! tty-focus - terminal input decoding and focus-stack dispatch for modal TUIs
//!
//! Raw bytes read from a terminal in raw mode go through two stages:
//!
//! - [`StreamDecoder`] turns bytes into ordered [`Input`] events (control
//!   codes, arrow keys, cursor-position reports, ASCII and UTF-8 text),
//!   independent of how the bytes were chunked.
//! - [`Dispatcher`] routes those events to whichever modal surface currently
//!   holds focus, buffering bursts and folding ESC+printable Alt chords.
//!
//! ```ignore
//! let mut decoder = StreamDecoder::new();
//! let mut dispatcher = Dispatcher::new();
//! let menu = ContextMenu::new(|action| println!("{action:?}"));
//! menu.show(&mut dispatcher, 0, 0, 80, 24);
//! dispatcher.handle(decoder.feed(b"\x1b[B\r")?);
//! ```

pub mod config;
pub mod core;
pub mod ui;

pub use crate::config::Config;
pub use crate::core::{Control, ControlKey, CursorKey, DecodeError, Input, Response, StreamDecoder};
pub use crate::ui::{Dispatcher, FocusHandle, HandlerTable};
