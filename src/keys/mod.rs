//! Keyboard shortcut dispatch.
//!
//! The UI layer turns each keyboard event into a [`KeyEvent`], asks a
//! registry to [`handle`](KeyHandlerRegistry::handle) it and replays the
//! returned [`Dispatch`] onto the real event.

pub mod action;
pub mod chord;
pub mod defaults;
pub mod event;
pub mod popover;
pub mod registry;

pub use action::Action;
pub use chord::KeyChord;
pub use defaults::{default_shortcut, default_shortcuts};
pub use event::{Dispatch, EventControl, KeyEvent};
pub use popover::PopoverMonitor;
pub use registry::{Handler, KeyHandlerRegistry, SharedKeyRegistry};
