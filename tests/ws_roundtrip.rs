use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use futures::{SinkExt, StreamExt};
use koso::error::RetryPolicy;
use koso::server::{self, api::AppState};
use koso::sync::protocol::{koso_awareness_state, ProtocolMessage, SyncMessage};
use koso::sync::{remote::connect_peer, SyncClient};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use yrs::{Doc, Map, ReadTxn, Transact};

type RawSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> Result<(u16, JoinHandle<()>)> {
    start_server_with(AppState::new(Doc::new())).await
}

async fn start_server_with(state: AppState) -> Result<(u16, JoinHandle<()>)> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let port = listener.local_addr()?.port();
    let handle = tokio::spawn(async move {
        let _ = server::serve_listener(listener, state).await;
    });
    Ok((port, handle))
}

/// A bare socket that sees every frame the relay sends. Returns once the
/// server's own sync request has arrived, so the socket is subscribed to
/// the relay.
async fn connect_raw(port: u16) -> Result<RawSocket> {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{}/ws", port)).await?;
    let first = timeout(Duration::from_secs(3), ws.next()).await?;
    match first {
        Some(Ok(Message::Binary(data))) => match ProtocolMessage::decode(&data)? {
            ProtocolMessage::Sync(SyncMessage::Request(_)) => Ok(ws),
            other => bail!("expected a sync request first, got {other:?}"),
        },
        other => bail!("expected a binary frame, got {other:?}"),
    }
}

async fn next_awareness(ws: &mut RawSocket, wait: Duration) -> Option<String> {
    timeout(wait, async {
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Binary(data) = msg {
                if let Ok(ProtocolMessage::Awareness { state, .. }) = ProtocolMessage::decode(&data) {
                    return Some(state);
                }
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

async fn connect(port: u16, doc: Doc) -> Result<(Arc<SyncClient>, JoinHandle<()>)> {
    let (client, outbound) = SyncClient::new(doc)?;
    let client = Arc::new(client);
    let handle = connect_peer(
        &format!("ws://127.0.0.1:{}/ws", port),
        client.clone(),
        outbound,
        &RetryPolicy::aggressive(),
    )
    .await?;
    Ok((client, handle))
}

fn insert(doc: &Doc, key: &str, value: &str) {
    let graph = doc.get_or_insert_map("graph");
    let mut txn = doc.transact_mut();
    graph.insert(&mut txn, key, value);
}

fn has_key(doc: &Doc, key: &str) -> bool {
    let txn = doc.transact();
    txn.get_map("graph")
        .is_some_and(|graph| graph.contains_key(&txn, key))
}

async fn eventually(check: impl FnMut() -> bool) -> bool {
    eventually_within(Duration::from_secs(3), check).await
}

async fn eventually_within(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    timeout(limit, async {
        while !check() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn late_joiner_receives_existing_state() -> Result<()> {
    let (port, server) = start_server().await?;

    let doc_a = Doc::with_client_id(1);
    insert(&doc_a, "root", "Root");
    let (client_a, conn_a) = connect(port, doc_a).await?;
    assert!(
        eventually(|| client_a.sync_state().server_synced).await,
        "client A never finished the handshake"
    );

    // A's offline edit reaches the server through the server's own request.
    sleep(Duration::from_millis(100)).await;

    let (client_b, conn_b) = connect(port, Doc::with_client_id(2)).await?;
    assert!(
        eventually(|| has_key(client_b.doc(), "root")).await,
        "client B never received A's state"
    );
    assert!(client_b.sync_state().server_synced);

    conn_a.abort();
    conn_b.abort();
    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn live_edits_are_relayed() -> Result<()> {
    let (port, server) = start_server().await?;

    let (client_a, conn_a) = connect(port, Doc::with_client_id(1)).await?;
    let (client_b, conn_b) = connect(port, Doc::with_client_id(2)).await?;
    assert!(eventually(|| client_a.sync_state().server_synced).await);
    assert!(eventually(|| client_b.sync_state().server_synced).await);

    insert(client_a.doc(), "task-1", "Write the relay");
    assert!(
        eventually(|| has_key(client_b.doc(), "task-1")).await,
        "edit from A was not relayed to B"
    );

    insert(client_b.doc(), "task-2", "Review the relay");
    assert!(
        eventually(|| has_key(client_a.doc(), "task-2")).await,
        "edit from B was not relayed to A"
    );

    conn_a.abort();
    conn_b.abort();
    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lagging_client_catches_up() -> Result<()> {
    // A tiny relay buffer makes B fall behind during the burst.
    let (port, server) = start_server_with(AppState::with_relay_capacity(Doc::new(), 4)).await?;

    let (client_a, conn_a) = connect(port, Doc::with_client_id(1)).await?;
    let (client_b, conn_b) = connect(port, Doc::with_client_id(2)).await?;
    assert!(eventually(|| client_a.sync_state().server_synced).await);
    assert!(eventually(|| client_b.sync_state().server_synced).await);

    let keys: Vec<String> = (0..500).map(|i| format!("task-{i}")).collect();
    for key in &keys {
        insert(client_a.doc(), key, "burst");
    }

    assert!(
        eventually_within(Duration::from_secs(10), || keys
            .iter()
            .all(|key| has_key(client_b.doc(), key)))
        .await,
        "client B never converged after falling behind"
    );

    conn_a.abort();
    conn_b.abort();
    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn awareness_is_relayed_to_others_only() -> Result<()> {
    let (port, server) = start_server().await?;

    let mut socket_a = connect_raw(port).await?;
    let mut socket_b = connect_raw(port).await?;

    let presence = r#"{"clientId":1,"selected":["task-1"]}"#;
    socket_a
        .send(Message::Binary(koso_awareness_state(presence).into()))
        .await?;

    assert_eq!(
        next_awareness(&mut socket_b, Duration::from_secs(3)).await.as_deref(),
        Some(presence)
    );
    assert_eq!(
        next_awareness(&mut socket_a, Duration::from_millis(300)).await,
        None,
        "sender got its own awareness back"
    );

    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn relay_survives_a_client_disconnect() -> Result<()> {
    let (port, server) = start_server().await?;

    let (client_b, conn_b) = connect(port, Doc::with_client_id(2)).await?;
    let (client_c, conn_c) = connect(port, Doc::with_client_id(3)).await?;
    assert!(eventually(|| client_b.sync_state().server_synced).await);
    assert!(eventually(|| client_c.sync_state().server_synced).await);

    let mut socket_a = connect_raw(port).await?;
    socket_a.close(None).await?;
    drop(socket_a);
    sleep(Duration::from_millis(50)).await;

    insert(client_b.doc(), "task-3", "Still relayed");
    assert!(
        eventually(|| has_key(client_c.doc(), "task-3")).await,
        "relay stopped after a client left"
    );

    conn_b.abort();
    conn_c.abort();
    server.abort();
    Ok(())
}
