//! WebSocket gateway
//!
//! Accepts WebSocket connections and turns each into a broadcaster session.
//! Each connection runs two halves:
//!
//! 1. A writer task draining the session's outbound channel into the socket
//! 2. A read loop decoding frames and dispatching them one at a time
//!
//! Because the read loop awaits each dispatch, events from one session are
//! handled strictly in order; different sessions interleave freely.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::broadcaster::Broadcaster;
use super::message::Event;

/// Realtime WebSocket listener
pub struct Gateway {
    listener: TcpListener,
    broadcaster: Arc<Broadcaster>,
}

impl Gateway {
    /// Bind the listener
    pub async fn bind(addr: SocketAddr, broadcaster: Arc<Broadcaster>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind realtime gateway on {}", addr))?;
        Ok(Self {
            listener,
            broadcaster,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails
    pub async fn run(self) -> Result<()> {
        info!("Realtime gateway listening on ws://{}", self.local_addr()?);

        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .context("Failed to accept realtime connection")?;

            let broadcaster = self.broadcaster.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, broadcaster).await {
                    warn!("Realtime connection from {} failed: {:#}", peer, e);
                }
            });
        }
    }
}

async fn handle_connection(stream: TcpStream, broadcaster: Arc<Broadcaster>) -> Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .context("WebSocket handshake failed")?;
    let (mut write, mut read) = ws_stream.split();

    let (session_id, mut outbound) = broadcaster.connect().await;

    // Ends once the registry drops the session's sender
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = write.send(Message::Text(frame)).await {
                debug!("Send to {} failed: {}", session_id, e);
                break;
            }
        }
        write.close().await.ok();
    });

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => match Event::decode(&text) {
                Ok(event) => {
                    broadcaster.dispatch(session_id, event).await;
                }
                Err(e) => {
                    warn!("Dropping undecodable frame from {}: {}", session_id, e);
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Connection error for {}: {}", session_id, e);
                break;
            }
        }
    }

    broadcaster.disconnect(session_id).await;
    writer.await.ok();
    Ok(())
}
