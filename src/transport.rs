//! # Transport capability interface and the TCP implementation.
//!
//! [`Transport`] is the seam between the session/supervisor logic and the
//! actual network: `connect`, `send`, `receive`, `close`. The production
//! implementation is [`TcpTransport`]; tests substitute fakes for
//! deterministic timeout and cancellation behavior.
//!
//! ## Rules
//! - Every blocking method cooperates with its [`CancellationToken`] and
//!   returns [`ClientError::Canceled`] when it fires.
//! - At most one underlying socket is held per transport instance.
//! - `close` is idempotent and silent: closing an absent socket is a no-op.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Shared handle to a factory minting fresh transports, one per connection
/// attempt.
pub type TransportFactory = Arc<dyn Fn() -> Box<dyn Transport> + Send + Sync>;

/// # Cancellable byte transport.
///
/// The minimal capability set the keep-alive loop needs from a socket.
/// Methods take `&mut self`: a transport is driven sequentially by exactly one
/// session, never concurrently.
#[async_trait]
pub trait Transport: Send {
    /// Connects to the remote address.
    async fn connect(&mut self, addr: SocketAddr, ctx: CancellationToken)
        -> Result<(), ClientError>;

    /// Sends the full payload, returning the number of bytes written.
    async fn send(&mut self, payload: &[u8], ctx: CancellationToken)
        -> Result<usize, ClientError>;

    /// Receives into `buf`, returning the number of bytes read.
    ///
    /// A return of `0` means the remote closed the connection.
    async fn receive(
        &mut self,
        buf: &mut [u8],
        ctx: CancellationToken,
    ) -> Result<usize, ClientError>;

    /// Gracefully shuts down and releases the socket, if one is held.
    async fn close(&mut self);
}

/// Production TCP transport backed by [`tokio::net::TcpStream`].
#[derive(Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Creates a transport with no socket held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a factory minting fresh TCP transports.
    pub fn factory() -> TransportFactory {
        Arc::new(|| Box::new(TcpTransport::new()))
    }

    fn stream(&mut self) -> Result<&mut TcpStream, ClientError> {
        self.stream
            .as_mut()
            .ok_or_else(|| ClientError::transport("not connected"))
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(
        &mut self,
        addr: SocketAddr,
        ctx: CancellationToken,
    ) -> Result<(), ClientError> {
        let stream = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ClientError::Canceled),
            res = TcpStream::connect(addr) => res.map_err(ClientError::transport)?,
        };
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(
        &mut self,
        payload: &[u8],
        ctx: CancellationToken,
    ) -> Result<usize, ClientError> {
        let stream = self.stream()?;
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ClientError::Canceled),
            res = stream.write_all(payload) => {
                res.map_err(ClientError::transport)?;
                Ok(payload.len())
            }
        }
    }

    async fn receive(
        &mut self,
        buf: &mut [u8],
        ctx: CancellationToken,
    ) -> Result<usize, ClientError> {
        let stream = self.stream()?;
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ClientError::Canceled),
            res = stream.read(buf) => res.map_err(ClientError::transport),
        }
    }

    async fn close(&mut self) {
        // Half-close the write side first; errors on an already-dead socket
        // are irrelevant at this point.
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}
