//! # Koso - collaborative task-graph core
//!
//! Two independent pieces of the Koso client, plus the plumbing to run them:
//!
//! - **Sync**: y-sync framing over `yrs` documents. [`sync::encode_sync_request`]
//!   builds the handshake, [`sync::SyncClient`] drives a document through the
//!   protocol, and [`server`] relays documents between clients.
//! - **Keys**: [`keys::KeyHandlerRegistry`] maps key chords to actions and
//!   reports whether the event was handled and how it should propagate.
//!
//! ## Quick Start
//!
//! ```rust
//! use koso::keys::{Handler, KeyChord, KeyEvent, KeyHandlerRegistry};
//! use koso::sync::encode_sync_request;
//!
//! let registry = KeyHandlerRegistry::new([
//!     (KeyChord::new("z").meta(), Handler::new(|| println!("undo"))),
//! ]);
//! let dispatch = registry.handle(&KeyEvent::new("z").with_meta(true));
//! assert!(dispatch.handled() && dispatch.stop_propagation);
//!
//! let summary: &[u8] = &[1, 2, 3];
//! assert_eq!(encode_sync_request(summary).unwrap(), vec![0, 0, 3, 1, 2, 3]);
//! ```

pub mod config;
pub mod error;
pub mod keys;
pub mod logging;
pub mod server;
pub mod sync;

// Re-export main types for library consumers
pub use config::KosoConfig;
pub use error::{ConfigError, ProtocolError, ShortcutError};
pub use keys::{Dispatch, Handler, KeyChord, KeyEvent, KeyHandlerRegistry};
pub use sync::{encode_sync_request, SyncClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
