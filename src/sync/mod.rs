//! Real-time document sync over the y-sync protocol.
//!
//! `protocol` frames and parses messages, `client` drives one local `yrs`
//! document through the handshake, and `remote` carries the frames over a
//! WebSocket.

pub mod client;
pub mod protocol;
pub mod remote;

pub use client::{SyncClient, SyncState};
pub use protocol::{encode_sync_request, sync_request, ProtocolMessage, StateSummary, SyncMessage};
