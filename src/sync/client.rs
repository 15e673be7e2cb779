use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use yrs::{updates::decoder::Decode as _, Doc, Origin, ReadTxn, Subscription, Transact, Update};

use super::protocol::{sync_request, sync_response, sync_update, ProtocolMessage, SyncMessage};
use crate::error::ProtocolError;

/// Transaction origin for changes that arrived from the server. Updates with
/// this origin are never echoed back.
const REMOTE_ORIGIN: &str = "koso-remote";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Set once the server has answered our sync request.
    pub server_synced: bool,
}

/// Client side of the y-sync protocol for one document.
///
/// Every frame the client wants to send (handshake, responses, local
/// updates) goes out through the receiver returned by [`SyncClient::new`];
/// the transport owns that end.
pub struct SyncClient {
    doc: Doc,
    outbound: UnboundedSender<Vec<u8>>,
    server_synced: AtomicBool,
    _local_updates: Subscription,
}

impl SyncClient {
    pub fn new(doc: Doc) -> Result<(Self, UnboundedReceiver<Vec<u8>>)> {
        let (outbound, rx) = mpsc::unbounded_channel();

        let forward = outbound.clone();
        let remote = Origin::from(REMOTE_ORIGIN);
        let subscription = doc
            .observe_update_v2(move |txn, event| {
                if txn.origin() == Some(&remote) {
                    return;
                }
                if forward.send(sync_update(&event.update)).is_err() {
                    tracing::debug!("Dropping local update, transport is gone");
                }
            })
            .map_err(|e| anyhow!("failed to observe document updates: {e:?}"))?;

        let client = Self {
            doc,
            outbound,
            server_synced: AtomicBool::new(false),
            _local_updates: subscription,
        };
        Ok((client, rx))
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    pub fn sync_state(&self) -> SyncState {
        SyncState {
            server_synced: self.server_synced.load(Ordering::Acquire),
        }
    }

    /// Queue the handshake: a sync request carrying our state vector.
    pub fn connect(&self) {
        let sv = self.doc.transact().state_vector();
        tracing::debug!("Sending sync_request message");
        self.send(sync_request(&sv));
    }

    /// Apply one binary frame received from the server.
    #[tracing::instrument(skip_all, fields(len = data.len()))]
    pub fn handle_server_message(&self, data: &[u8]) -> Result<(), ProtocolError> {
        match ProtocolMessage::decode(data)? {
            ProtocolMessage::Sync(SyncMessage::Request(sv)) => {
                tracing::debug!("Handling sync_request message");
                let update = self.doc.transact().encode_state_as_update_v2(&sv);
                self.send(sync_response(&update));
            }
            ProtocolMessage::Sync(SyncMessage::Response(update)) => {
                tracing::debug!("Handling sync_response message");
                self.apply_remote_update(&update)?;
                self.server_synced.store(true, Ordering::Release);
            }
            ProtocolMessage::Sync(SyncMessage::Update(update)) => {
                tracing::debug!("Handling sync_update message");
                self.apply_remote_update(&update)?;
            }
            ProtocolMessage::Awareness { kind, .. } => {
                tracing::debug!(?kind, "Ignoring awareness message");
            }
        }
        Ok(())
    }

    fn apply_remote_update(&self, data: &[u8]) -> Result<(), ProtocolError> {
        let update = Update::decode_v2(data)?;
        let mut txn = self.doc.transact_mut_with(REMOTE_ORIGIN);
        txn.apply_update(update)
            .map_err(|e| ProtocolError::Apply(e.to_string()))
    }

    fn send(&self, frame: Vec<u8>) {
        if self.outbound.send(frame).is_err() {
            tracing::warn!("Outbound channel closed, dropping frame");
        }
    }
}
