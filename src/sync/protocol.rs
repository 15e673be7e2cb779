//! y-sync wire framing.
//!
//! Every frame is `varint(message type) ‖ varint(sub type) ‖ payload`, where
//! sync payloads are length-prefixed buffers produced by `yrs`. State vectors
//! travel v1-encoded; document updates travel v2-encoded.

use std::convert::Infallible;

use yrs::{
    encoding::{read::Read as _, write::Write as _},
    updates::{
        decoder::{Decode as _, DecoderV1},
        encoder::{Encode as _, Encoder as _, EncoderV1},
    },
    StateVector,
};

use crate::error::ProtocolError;

pub const MSG_SYNC: u8 = 0;

pub const MSG_SYNC_REQUEST: u8 = 0;
pub const MSG_SYNC_RESPONSE: u8 = 1;
pub const MSG_SYNC_UPDATE: u8 = 2;

pub const MSG_KOSO_AWARENESS: u8 = 8;

pub const MSG_KOSO_AWARENESS_UPDATE: u8 = 0;
pub const MSG_KOSO_AWARENESS_STATE: u8 = 1;

/// Something that can summarize which updates a replica has incorporated.
///
/// The encoder never looks inside the summary; it only frames the bytes.
/// Serializer failures are handed back to the caller as-is.
pub trait StateSummary {
    type Error;

    fn encode_summary(&self) -> Result<Vec<u8>, Self::Error>;
}

impl StateSummary for StateVector {
    type Error = Infallible;

    fn encode_summary(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.encode_v1())
    }
}

/// Pre-serialized summary bytes.
impl StateSummary for [u8] {
    type Error = Infallible;

    fn encode_summary(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.to_vec())
    }
}

/// Build the sync step 1 frame for an arbitrary state summary.
pub fn encode_sync_request<S>(local_state: &S) -> Result<Vec<u8>, S::Error>
where
    S: StateSummary + ?Sized,
{
    let summary = local_state.encode_summary()?;
    Ok(frame(MSG_SYNC, MSG_SYNC_REQUEST, &summary))
}

/// Sync step 1: ask the peer for everything not covered by `sv`.
pub fn sync_request(sv: &StateVector) -> Vec<u8> {
    frame(MSG_SYNC, MSG_SYNC_REQUEST, &sv.encode_v1())
}

/// Sync step 2: the v2 update answering a peer's request.
pub fn sync_response(update: &[u8]) -> Vec<u8> {
    frame(MSG_SYNC, MSG_SYNC_RESPONSE, update)
}

/// An incremental v2 update produced by a local transaction.
pub fn sync_update(update: &[u8]) -> Vec<u8> {
    frame(MSG_SYNC, MSG_SYNC_UPDATE, update)
}

pub fn koso_awareness_state(state: &str) -> Vec<u8> {
    let mut encoder = EncoderV1::new();
    encoder.write_var(MSG_KOSO_AWARENESS);
    encoder.write_var(MSG_KOSO_AWARENESS_STATE);
    encoder.write_string(state);
    encoder.to_vec()
}

pub fn koso_awareness_update(state: &str) -> Vec<u8> {
    let mut encoder = EncoderV1::new();
    encoder.write_var(MSG_KOSO_AWARENESS);
    encoder.write_var(MSG_KOSO_AWARENESS_UPDATE);
    encoder.write_string(state);
    encoder.to_vec()
}

fn frame(msg_type: u8, sub_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut encoder = EncoderV1::new();
    encoder.write_var(msg_type);
    encoder.write_var(sub_type);
    encoder.write_buf(payload);
    encoder.to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    Request(StateVector),
    Response(Vec<u8>),
    Update(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwarenessKind {
    Update,
    State,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolMessage {
    Sync(SyncMessage),
    Awareness { kind: AwarenessKind, state: String },
}

impl ProtocolMessage {
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut decoder = DecoderV1::from(data);
        match decoder.read_var::<u8>()? {
            MSG_SYNC => {
                let msg = match decoder.read_var::<u8>()? {
                    MSG_SYNC_REQUEST => {
                        SyncMessage::Request(StateVector::decode_v1(decoder.read_buf()?)?)
                    }
                    MSG_SYNC_RESPONSE => SyncMessage::Response(decoder.read_buf()?.to_vec()),
                    MSG_SYNC_UPDATE => SyncMessage::Update(decoder.read_buf()?.to_vec()),
                    invalid_type => return Err(ProtocolError::InvalidSyncType(invalid_type)),
                };
                Ok(ProtocolMessage::Sync(msg))
            }
            MSG_KOSO_AWARENESS => {
                let kind = match decoder.read_var::<u8>()? {
                    MSG_KOSO_AWARENESS_UPDATE => AwarenessKind::Update,
                    MSG_KOSO_AWARENESS_STATE => AwarenessKind::State,
                    invalid_type => return Err(ProtocolError::InvalidAwarenessType(invalid_type)),
                };
                let state = decoder.read_string()?.to_string();
                Ok(ProtocolMessage::Awareness { kind, state })
            }
            invalid_type => Err(ProtocolError::InvalidMessageType(invalid_type)),
        }
    }
}
