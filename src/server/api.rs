use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    routing::get,
    Json, Router,
};
use colored::*;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;
use yrs::{updates::decoder::Decode as _, Doc, ReadTxn, StateVector, Transact, Update};

use crate::error::ProtocolError;
use crate::sync::protocol::{sync_request, sync_response, sync_update, ProtocolMessage, SyncMessage};

/// A frame to fan out to every client except the one it came from.
#[derive(Debug, Clone)]
struct Relay {
    from: Uuid,
    frame: Arc<Vec<u8>>,
}

#[derive(Clone)]
pub struct AppState {
    doc: Arc<Mutex<Doc>>,
    relay: broadcast::Sender<Relay>,
}

/// Frames buffered per client before a slow client starts lagging.
pub const RELAY_CAPACITY: usize = 1000;

impl AppState {
    pub fn new(doc: Doc) -> Self {
        Self::with_relay_capacity(doc, RELAY_CAPACITY)
    }

    pub fn with_relay_capacity(doc: Doc, capacity: usize) -> Self {
        let (relay, _) = broadcast::channel(capacity);
        Self {
            doc: Arc::new(Mutex::new(doc)),
            relay,
        }
    }
}

pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    println!(
        "{} Server running at {}",
        "✓".green(),
        format!("ws://{}/ws", addr).bright_blue()
    );
    serve_listener(listener, AppState::new(Doc::new())).await
}

pub async fn serve_listener(listener: TcpListener, state: AppState) -> Result<()> {
    let app = Router::new()
        .route("/", get(|| async { "Koso Sync Server" }))
        .route("/health", get(|| async { Json("OK") }))
        .route("/ws", get(ws_handler))
        .with_state(state);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(state, socket))
}

#[tracing::instrument(skip_all, fields(%who))]
async fn handle_client(state: AppState, who: Uuid, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (direct_tx, mut direct_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    // Ask the client for whatever it has that we don't.
    let sv = state.doc.lock().transact().state_vector();
    let _ = direct_tx.send(sync_request(&sv));

    let mut relay_rx = state.relay.subscribe();
    let catch_up_doc = state.doc.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                Some(frame) = direct_rx.recv() => frame,
                relayed = relay_rx.recv() => match relayed {
                    Ok(relay) if relay.from == who => continue,
                    Ok(relay) => relay.frame.as_ref().clone(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Skipped updates are still in the doc.
                        tracing::warn!("Client lagged, skipped {skipped} frames, sending full state");
                        full_state_update(&catch_up_doc)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };
            if sender.send(Message::Binary(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Binary(data)) => {
                    if let Err(e) = process_message(&recv_state, who, &data, &direct_tx) {
                        tracing::warn!("Failed to process message: {e}");
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Got error reading from client socket: {e}");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::debug!("Client disconnected");
}

async fn handle_ws(state: AppState, socket: WebSocket) {
    handle_client(state, Uuid::new_v4(), socket).await
}

fn process_message(
    state: &AppState,
    who: Uuid,
    data: &[u8],
    direct: &mpsc::UnboundedSender<Vec<u8>>,
) -> Result<(), ProtocolError> {
    match ProtocolMessage::decode(data)? {
        ProtocolMessage::Sync(SyncMessage::Request(sv)) => {
            tracing::debug!("Handling sync_request message");
            let update = state.doc.lock().transact().encode_state_as_update_v2(&sv);
            // Only the requesting client is missing these changes.
            let _ = direct.send(sync_response(&update));
        }
        ProtocolMessage::Sync(SyncMessage::Response(update))
        | ProtocolMessage::Sync(SyncMessage::Update(update)) => {
            tracing::debug!("Handling sync_update|sync_response message");
            {
                let decoded = Update::decode_v2(&update)?;
                let doc = state.doc.lock();
                let mut txn = doc.transact_mut();
                txn.apply_update(decoded)
                    .map_err(|e| ProtocolError::Apply(e.to_string()))?;
            }
            broadcast(state, who, sync_update(&update));
        }
        ProtocolMessage::Awareness { .. } => {
            broadcast(state, who, data.to_vec());
        }
    }
    Ok(())
}

fn full_state_update(doc: &Mutex<Doc>) -> Vec<u8> {
    let update = doc
        .lock()
        .transact()
        .encode_state_as_update_v2(&StateVector::default());
    sync_update(&update)
}

fn broadcast(state: &AppState, from: Uuid, frame: Vec<u8>) {
    // No receivers just means nobody else is connected.
    let _ = state.relay.send(Relay {
        from,
        frame: Arc::new(frame),
    });
}
