//! WebSocket session to one Hydra node.
//!
//! A [`Session`] owns the socket through an internal event loop task:
//! inbound frames are decoded and handed to the event sink in arrival
//! order, outbound commands are serialized and written through a command
//! channel. When the link drops for any reason other than an explicit
//! [`Session::shutdown`], the loop emits one synthetic
//! [`NodeEvent::ConnectionLost`] before terminating; the session never
//! redials on its own.
//!
//! # Endpoint Derivation
//!
//! Nodes are configured by their HTTP API address. [`derive_ws_url`] maps
//! it onto the event endpoint: `http`→`ws`, `https`→`wss`, path `/`, with
//! `history=yes|no` and an optional `address` filter as query parameters.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::command::ClientCommand;
use crate::protocol::event::{NodeEvent, decode_frame};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream type.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Callback receiving every decoded inbound event, in arrival order.
///
/// Called from the session's event loop; implementations must not block
/// and must not await.
pub type EventSink = Box<dyn Fn(NodeEvent) + Send + Sync>;

// ============================================================================
// URL Derivation
// ============================================================================

/// Derives the node's WebSocket event endpoint from its API address.
///
/// # Errors
///
/// [`Error::Config`] when the address scheme is not `http(s)` / `ws(s)`.
pub fn derive_ws_url(node_url: &Url, history: bool, address: Option<&str>) -> Result<Url> {
    let scheme = match node_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::config(format!(
                "unsupported node url scheme: {other}"
            )));
        }
    };

    let mut ws_url = node_url.clone();
    ws_url
        .set_scheme(scheme)
        .map_err(|()| Error::config(format!("cannot derive a websocket url from {node_url}")))?;
    ws_url.set_path("/");
    ws_url.set_query(None);
    {
        let mut pairs = ws_url.query_pairs_mut();
        pairs.append_pair("history", if history { "yes" } else { "no" });
        if let Some(address) = address {
            pairs.append_pair("address", address);
        }
    }
    Ok(ws_url)
}

// ============================================================================
// SessionCommand
// ============================================================================

/// Internal commands for the event loop.
enum SessionCommand {
    /// Write one serialized frame.
    Send {
        frame: String,
        result_tx: oneshot::Sender<Result<()>>,
    },
    /// Close the socket gracefully.
    Shutdown,
}

// ============================================================================
// Session
// ============================================================================

/// Live session to one node.
///
/// Cheap to clone; all clones drive the same socket. Dropping every clone
/// leaves the event loop running until the socket closes, so callers end
/// sessions with [`Session::shutdown`].
#[derive(Debug)]
pub struct Session {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    alive: Arc<AtomicBool>,
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            alive: Arc::clone(&self.alive),
        }
    }
}

impl Session {
    /// Dials the node and starts the event loop.
    ///
    /// Inbound frames flow into `events` from the moment this returns;
    /// callers register any waiters before connecting.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] when the dial exceeds `connect_timeout`
    /// - [`Error::Connection`] when the dial fails
    pub async fn connect(
        ws_url: &Url,
        connect_timeout: Duration,
        events: EventSink,
    ) -> Result<Self> {
        let (ws_stream, _response) = timeout(connect_timeout, connect_async(ws_url.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(connect_timeout.as_millis() as u64))?
            .map_err(|e| Error::connection(format!("dial {ws_url} failed: {e}")))?;

        info!(url = %ws_url, "connected to node");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            events,
            Arc::clone(&alive),
        ));

        Ok(Self { command_tx, alive })
    }

    /// Returns `true` while the event loop holds a live socket.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Serializes and sends one command.
    ///
    /// A write failure tears the session down, which synthesizes
    /// `ConnectionLost` into the event sink; this method additionally
    /// reports the failure to the caller.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] when the link is down or the write fails
    /// - [`Error::Json`] when the command cannot be serialized
    pub async fn send(&self, command: &ClientCommand) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::transport("link is down"));
        }

        let frame = serde_json::to_string(command)?;
        let (result_tx, result_rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::Send { frame, result_tx })
            .map_err(|_| Error::transport("session loop stopped"))?;

        result_rx.await?
    }

    /// Closes the socket gracefully.
    ///
    /// An explicit shutdown is a clean end of session and does not
    /// synthesize `ConnectionLost`.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(SessionCommand::Shutdown);
    }

    /// Event loop owning both socket halves.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
        events: EventSink,
        alive: Arc<AtomicBool>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut lost = true;

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(bytes = text.len(), "frame received");
                            // A malformed frame never interrupts the stream;
                            // decode_frame already logged it.
                            if let Ok(event) = decode_frame(text.as_str()) {
                                events(event);
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("socket closed by node");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "socket error");
                            break;
                        }

                        None => {
                            debug!("socket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong.
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(SessionCommand::Send { frame, result_tx }) => {
                            match ws_write.send(Message::Text(frame.into())).await {
                                Ok(()) => {
                                    let _ = result_tx.send(Ok(()));
                                }
                                Err(e) => {
                                    error!(error = %e, "send failed");
                                    let _ = result_tx.send(Err(Error::transport(format!(
                                        "send failed: {e}"
                                    ))));
                                    break;
                                }
                            }
                        }

                        Some(SessionCommand::Shutdown) => {
                            debug!("session shutdown requested");
                            let _ = ws_write.close().await;
                            lost = false;
                            break;
                        }

                        None => {
                            debug!("session handle dropped");
                            let _ = ws_write.close().await;
                            lost = false;
                            break;
                        }
                    }
                }
            }
        }

        alive.store(false, Ordering::SeqCst);

        // Fail whatever was queued behind the break.
        command_rx.close();
        while let Ok(command) = command_rx.try_recv() {
            if let SessionCommand::Send { result_tx, .. } = command {
                let _ = result_tx.send(Err(Error::ConnectionClosed));
            }
        }

        if lost {
            warn!("link lost");
            events(NodeEvent::ConnectionLost);
        }

        debug!("session loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use futures_util::StreamExt;
    use parking_lot::Mutex;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::accept_async;

    /// Scripted node: sends `frames`, then records client frames until the
    /// client goes away, then closes.
    async fn spawn_node(frames: Vec<String>) -> (SocketAddr, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("handshake");

            for frame in frames {
                ws.send(Message::Text(frame.into())).await.expect("send");
            }

            let mut received = Vec::new();
            while let Ok(Some(message)) = timeout(Duration::from_secs(2), ws.next()).await {
                match message {
                    Ok(Message::Text(text)) => received.push(text.as_str().to_string()),
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
            received
        });

        (addr, handle)
    }

    fn collecting_sink() -> (EventSink, Arc<Mutex<Vec<NodeEvent>>>) {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let sink_target = Arc::clone(&collected);
        let sink: EventSink = Box::new(move |event| sink_target.lock().push(event));
        (sink, collected)
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within 2s");
    }

    fn ws_url_for(addr: SocketAddr) -> Url {
        Url::parse(&format!("ws://{addr}/")).expect("url")
    }

    #[test]
    fn test_derive_ws_url_maps_schemes() {
        let http = Url::parse("http://node.example:4001/api").expect("url");
        let derived = derive_ws_url(&http, false, None).expect("derive");
        assert_eq!(derived.as_str(), "ws://node.example:4001/?history=no");

        let https = Url::parse("https://node.example:4001").expect("url");
        let derived = derive_ws_url(&https, true, None).expect("derive");
        assert_eq!(derived.as_str(), "wss://node.example:4001/?history=yes");
    }

    #[test]
    fn test_derive_ws_url_appends_address_filter() {
        let base = Url::parse("http://127.0.0.1:4001").expect("url");
        let derived = derive_ws_url(&base, false, Some("addr_test1 p")).expect("derive");
        assert_eq!(
            derived.as_str(),
            "ws://127.0.0.1:4001/?history=no&address=addr_test1+p"
        );
    }

    #[test]
    fn test_derive_ws_url_rejects_unknown_scheme() {
        let base = Url::parse("ftp://node.example").expect("url");
        let err = derive_ws_url(&base, false, None).unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[tokio::test]
    async fn test_events_arrive_in_order_and_loss_is_synthesized() {
        let (addr, _node) = spawn_node(vec![
            r#"{"tag": "PeerConnected", "peer": "2"}"#.to_string(),
            r#"{"tag": "PeerConnected", "peer": "3"}"#.to_string(),
        ])
        .await;

        let (sink, collected) = collecting_sink();
        let session = Session::connect(&ws_url_for(addr), Duration::from_secs(5), sink)
            .await
            .expect("connect");

        wait_until(|| collected.lock().len() >= 3).await;

        let events = collected.lock().clone();
        assert_eq!(events[0], NodeEvent::PeerConnected { peer: "2".into() });
        assert_eq!(events[1], NodeEvent::PeerConnected { peer: "3".into() });
        assert_eq!(events[2], NodeEvent::ConnectionLost);
        assert!(!session.is_alive());
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_stop_the_stream() {
        let (addr, _node) = spawn_node(vec![
            "{not json".to_string(),
            r#"{"tag": "PeerConnected", "peer": "2"}"#.to_string(),
        ])
        .await;

        let (sink, collected) = collecting_sink();
        let _session = Session::connect(&ws_url_for(addr), Duration::from_secs(5), sink)
            .await
            .expect("connect");

        wait_until(|| {
            collected
                .lock()
                .iter()
                .any(|e| matches!(e, NodeEvent::PeerConnected { .. }))
        })
        .await;
    }

    #[tokio::test]
    async fn test_send_writes_the_wire_tag() {
        let (addr, node) = spawn_node(Vec::new()).await;

        let (sink, _collected) = collecting_sink();
        let session = Session::connect(&ws_url_for(addr), Duration::from_secs(5), sink)
            .await
            .expect("connect");

        session.send(&ClientCommand::Init).await.expect("send");
        session.shutdown();

        let received = node.await.expect("node");
        assert_eq!(received, vec![r#"{"tag":"Init"}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_send_after_loss_is_a_transport_error() {
        let (addr, _node) = spawn_node(Vec::new()).await;

        let (sink, collected) = collecting_sink();
        let session = Session::connect(&ws_url_for(addr), Duration::from_secs(5), sink)
            .await
            .expect("connect");

        // The scripted node times out its read after 2s and closes.
        wait_until(|| !session.is_alive()).await;
        wait_until(|| {
            collected
                .lock()
                .iter()
                .any(|e| matches!(e, NodeEvent::ConnectionLost))
        })
        .await;

        let err = session.send(&ClientCommand::Close).await.unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_shutdown_is_clean_without_connection_lost() {
        let (addr, _node) = spawn_node(Vec::new()).await;

        let (sink, collected) = collecting_sink();
        let session = Session::connect(&ws_url_for(addr), Duration::from_secs(5), sink)
            .await
            .expect("connect");

        session.shutdown();
        wait_until(|| !session.is_alive()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(collected.lock().is_empty());
    }

    #[tokio::test]
    async fn test_connect_refused_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let (sink, _collected) = collecting_sink();
        let err = Session::connect(&ws_url_for(addr), Duration::from_secs(5), sink)
            .await
            .unwrap_err();
        assert!(err.is_connection_error());
    }
}
