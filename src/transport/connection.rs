//! WebSocket connection driver.
//!
//! Binds a [`Client`] to a tokio-tungstenite socket:
//!
//! - the handshake requests the `graphql-transport-ws` sub-protocol and
//!   fails if the server does not select it,
//! - once connected the client's pending frames are flushed,
//! - a reader loop feeds text frames to the router one at a time,
//! - a writer task drains the outbound channel in order,
//! - when the socket ends every active subscription is completed silently.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::protocol::SUBPROTOCOL;

// ============================================================================
// Types
// ============================================================================

/// Socket produced by [`connect_async`].
type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Connection Task
// ============================================================================

/// Connects `client` to the endpoint in `request` and drives the socket
/// until it closes.
pub(crate) async fn run(client: Client, request: Request, frames: mpsc::UnboundedReceiver<String>) {
    let stream = match establish(request).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "Connection failed");
            client.handle_close();
            return;
        }
    };

    drive(client, stream, frames).await;
}

/// Performs the WebSocket handshake and checks sub-protocol negotiation.
async fn establish(request: Request) -> Result<ClientStream> {
    let uri = request.uri().clone();
    let (stream, response) = connect_async(request).await?;

    let selected = response
        .headers()
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok());

    if selected != Some(SUBPROTOCOL) {
        return Err(Error::protocol(format!(
            "server selected sub-protocol {selected:?}, expected {SUBPROTOCOL:?}"
        )));
    }

    debug!(%uri, "WebSocket connected");
    Ok(stream)
}

/// Runs the reader and writer over an established socket.
pub(crate) async fn drive<S>(
    client: Client,
    stream: WebSocketStream<S>,
    frames: mpsc::UnboundedReceiver<String>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (ws_write, ws_read) = stream.split();
    let shutdown = client.shutdown_signal();

    let writer = tokio::spawn(write_loop(ws_write, frames, Arc::clone(&shutdown)));

    client.mark_open();
    read_loop(ws_read, &client).await;
    client.handle_close();

    if let Err(e) = writer.await {
        warn!(error = %e, "Writer task failed");
    }

    debug!("Connection terminated");
}

/// Feeds inbound frames to the client, one at a time.
async fn read_loop<S>(mut ws_read: SplitStream<WebSocketStream<S>>, client: &Client)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = ws_read.next().await {
        match message {
            Ok(WsMessage::Text(text)) => {
                client.receive(&text).await;
            }

            Ok(WsMessage::Binary(bytes)) => {
                client.receive(&String::from_utf8_lossy(&bytes)).await;
            }

            Ok(WsMessage::Close(frame)) => {
                debug!(?frame, "WebSocket closed by remote");
                break;
            }

            Err(e) => {
                warn!(error = %e, "WebSocket error");
                break;
            }

            // Ping/Pong are answered by tungstenite
            Ok(_) => {}
        }
    }
}

/// Writes outbound frames in order until shutdown is signalled.
async fn write_loop<S>(
    mut ws_write: SplitSink<WebSocketStream<S>, WsMessage>,
    mut frames: mpsc::UnboundedReceiver<String>,
    shutdown: Arc<Notify>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;

            frame = frames.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                if let Err(e) = ws_write.send(WsMessage::Text(frame.into())).await {
                    warn!(error = %e, "Failed to write frame");
                    break;
                }
                trace!("Frame written");
            }

            () = shutdown.notified() => {
                if let Err(e) = ws_write.close().await {
                    trace!(error = %e, "Close after socket end");
                }
                break;
            }
        }
    }
}
