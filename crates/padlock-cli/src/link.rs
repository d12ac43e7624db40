//! TCP stand-in for the wireless link.
//!
//! A peer connects over TCP, writes raw 8-byte command frames and receives
//! 4-byte little-endian status words. On connect the peer first reads the
//! current status, then notifications are enabled until it disconnects. A
//! peer never receives the same status twice in a row. One peer is served at
//! a time; further connections wait in the listen backlog.
//!
//! ```text
//! peer ──frames──▶ FrameCodec ──▶ FrameInbox ──▶ Mailbox<Command>
//! peer ◀──status── FrameCodec ◀── mpsc ◀── ChannelTransport
//!                             ◀── StatusReader (on connect)
//! ```

use futures::{SinkExt, StreamExt};
use padlock_core::DeviceStatus;
use padlock_firmware::{FrameInbox, NotifyGate, StatusReader};
use padlock_protocol::FrameCodec;
use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// Link listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Address peers connect to.
    pub listen_addr: SocketAddr,
    /// Capacity of the outbound status queue.
    pub status_queue: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 4100)),
            status_queue: 16,
        }
    }
}

/// Errors raised by the link server.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Failed to bind to {0}")]
    BindFailed(SocketAddr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),
}

/// Serves one peer at a time.
#[derive(Debug)]
pub struct LinkServer {
    listener: TcpListener,
    inbox: FrameInbox,
    gate: NotifyGate,
    reader: StatusReader,
    statuses: mpsc::Receiver<DeviceStatus>,
}

impl LinkServer {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::BindFailed` if the address is unavailable.
    pub async fn bind(
        addr: SocketAddr,
        inbox: FrameInbox,
        gate: NotifyGate,
        reader: StatusReader,
        statuses: mpsc::Receiver<DeviceStatus>,
    ) -> Result<Self, LinkError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| LinkError::BindFailed(addr))?;
        info!("Link listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            inbox,
            gate,
            reader,
            statuses,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve peers until the listener fails.
    ///
    /// A peer that breaks the stream is dropped; the server keeps accepting.
    ///
    /// # Errors
    ///
    /// Returns a listener socket error.
    pub async fn serve(mut self) -> Result<(), LinkError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            if let Err(e) = self.serve_peer(stream, addr).await {
                warn!("Peer {} dropped: {}", addr, e);
            }
        }
    }

    async fn serve_peer(&mut self, stream: TcpStream, addr: SocketAddr) -> Result<(), LinkError> {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }

        // Statuses queued before this peer subscribed are not theirs.
        while self.statuses.try_recv().is_ok() {}

        let mut framed = Framed::new(stream, FrameCodec::new());
        let mut last_forwarded = self.reader.get();
        framed
            .send(last_forwarded)
            .await
            .map_err(|e| LinkError::Codec(e.to_string()))?;

        self.gate.enable();
        info!("Peer {} connected, notifications enabled", addr);

        let result = loop {
            tokio::select! {
                frame = framed.next() => match frame {
                    Some(Ok(frame)) => {
                        self.inbox.accept(&frame);
                    }
                    Some(Err(e)) => break Err(LinkError::Codec(e.to_string())),
                    None => break Ok(()),
                },
                Some(status) = self.statuses.recv() => {
                    if status == last_forwarded {
                        continue;
                    }
                    debug!("Notifying {} of status {}", addr, status);
                    if let Err(e) = framed.send(status).await {
                        break Err(LinkError::Codec(e.to_string()));
                    }
                    last_forwarded = status;
                }
            }
        };

        self.gate.disable();
        info!(
            "Peer {} disconnected ({} noise bytes skipped)",
            addr,
            framed.codec().discarded()
        );
        result
    }
}
