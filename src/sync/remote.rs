use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::client::SyncClient;
use crate::error::{with_retry, RetryPolicy};

/// Connect to a sync server and bridge frames between it and `client`.
///
/// `outbound` is the receiver returned alongside `client` by
/// [`SyncClient::new`]. The handshake is queued as soon as the socket is
/// open. Returns a JoinHandle for the background task managing the
/// connection; it finishes when either side closes.
pub async fn connect_peer(
    url: &str,
    client: Arc<SyncClient>,
    mut outbound: UnboundedReceiver<Vec<u8>>,
    policy: &RetryPolicy,
) -> Result<JoinHandle<()>> {
    let url = Url::parse(url).map_err(|e| anyhow!("invalid ws url: {e}"))?;
    let target = url.as_str();
    let (ws_stream, _) = with_retry(policy, move || tokio_tungstenite::connect_async(target)).await?;
    tracing::info!(%url, "Connected to sync server");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    client.connect();

    // local -> remote
    let mut forward = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = ws_tx.send(Message::Binary(frame.into())).await {
                tracing::warn!("Failed to send frame to server: {e}");
                break;
            }
        }
    });

    // remote -> local
    let mut recv = tokio::spawn(async move {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Binary(data)) => {
                    if let Err(e) = client.handle_server_message(&data) {
                        tracing::warn!("Failed to process server message: {e}");
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Server closed connection");
                    break;
                }
                Ok(Message::Text(_)) => {
                    tracing::debug!("Ignoring unexpected text frame");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Got error reading from server socket: {e}");
                    break;
                }
            }
        }
    });

    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = &mut forward => recv.abort(),
            _ = &mut recv => forward.abort(),
        }
    });

    Ok(handle)
}
