//! Focus stack and modal surfaces.
//!
//! This module routes decoded input to exactly one consumer:
//!
//! - **handler**: `HandlerTable`, the per-surface declaration of trapped input
//! - **dispatcher**: focus stack, bounded event FIFO and ESC-chord lookahead
//! - **context_menu**: menu surface with accelerators
//! - **selector**: filterable selection list surface
//! - **renderer**: crossterm drawing of the base screen and visible surfaces
//!
//! # Focus
//!
//! Each surface builds one `HandlerTable` when it is shown, pushes it, and
//! dismisses it through its own `FocusHandle` when it closes. Only the top
//! entry receives input.

pub mod context_menu;
pub mod dispatcher;
pub mod handler;
pub mod renderer;
pub mod selector;

pub use context_menu::{ContextMenu, ContextMenuAction, MenuState};
pub use dispatcher::{Dispatcher, FocusHandle, DEFAULT_BATCH_QUOTA, DEFAULT_QUEUE_CAPACITY};
pub use handler::{HandlerTable, HandlerTableBuilder};
pub use renderer::{Renderer, Screen};
pub use selector::{Selector, SelectorState};
