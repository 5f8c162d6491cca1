//! # Connection session: one live socket from handshake to teardown.
//!
//! A [`Session`] only exists after a successful connect **and** handshake
//! send; holding one is proof of an established connection. All blocking calls
//! go through the deadline executor, each with its own budget.
//!
//! ## Lifecycle
//! ```text
//! Session::open(transport, addr, ...)
//!   ├─ connect within connect_timeout   ─ failure → transport closed, Err
//!   ├─ send handshake within connect_timeout ─ failure → transport closed, Err
//!   └─ Ok(Session)
//!
//! session.await_message(receive_timeout)
//!   ├─ bytes arrive   → Ok(payload)          (non-empty = liveness renewed)
//!   ├─ remote closed  → Err(Transport)       (empty read)
//!   └─ deadline hits  → Err(Timeout)
//!
//! session.close()
//!   └─ graceful shutdown under its own short deadline; idempotent
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::deadline;
use crate::error::ClientError;
use crate::transport::Transport;

/// Size of the receive buffer; liveness payloads are short status lines.
const RECEIVE_BUFFER: usize = 256;

/// One live connection to the remote feed.
///
/// Methods take `&mut self`: no two session operations ever run concurrently
/// on the same instance.
pub struct Session {
    transport: Box<dyn Transport>,
    close_timeout: Duration,
}

impl Session {
    /// Connects and performs the handshake, yielding a live session.
    ///
    /// Connect and the handshake send share the `connect_timeout` budget, one
    /// deadline each. On any failure the transport is closed before the error
    /// is returned, so no half-open socket outlives this call.
    pub async fn open(
        mut transport: Box<dyn Transport>,
        addr: SocketAddr,
        handshake: &str,
        connect_timeout: Duration,
        close_timeout: Duration,
        ctx: &CancellationToken,
    ) -> Result<Self, ClientError> {
        let connected = deadline::run(ctx, connect_timeout, |c| transport.connect(addr, c)).await;
        if let Err(err) = connected {
            Self::discard(transport, close_timeout).await;
            return Err(err);
        }

        let sent = deadline::run(ctx, connect_timeout, |c| {
            transport.send(handshake.as_bytes(), c)
        })
        .await;
        if let Err(err) = sent {
            Self::discard(transport, close_timeout).await;
            return Err(err);
        }

        Ok(Self {
            transport,
            close_timeout,
        })
    }

    /// Blocks until a liveness payload arrives or the deadline elapses.
    ///
    /// An empty read means the remote closed the connection; it is reported as
    /// a transport error and handled by the caller exactly like a timeout.
    pub async fn await_message(
        &mut self,
        receive_timeout: Duration,
        ctx: &CancellationToken,
    ) -> Result<Vec<u8>, ClientError> {
        let mut buf = vec![0u8; RECEIVE_BUFFER];
        let transport = &mut self.transport;
        let n = deadline::run(ctx, receive_timeout, |c| transport.receive(&mut buf, c)).await?;
        if n == 0 {
            return Err(ClientError::transport("remote closed the connection"));
        }
        buf.truncate(n);
        Ok(buf)
    }

    /// Gracefully closes the session under its own short deadline.
    ///
    /// Idempotent and infallible: a socket that is already gone, or a close
    /// that overruns its deadline, is simply abandoned.
    pub async fn close(&mut self) {
        let _ = time::timeout(self.close_timeout, self.transport.close()).await;
    }

    async fn discard(mut transport: Box<dyn Transport>, close_timeout: Duration) {
        let _ = time::timeout(close_timeout, transport.close()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{fake_factory, FakeBehavior};

    const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

    fn addr() -> SocketAddr {
        "127.0.0.1:9300".parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn open_sends_the_handshake() {
        let (factory, stats) = fake_factory(FakeBehavior::Stream {
            every: Duration::from_millis(10),
        });
        let token = CancellationToken::new();

        let mut session = Session::open(
            factory(),
            addr(),
            "S,CONNECT\r\n",
            CONNECT_TIMEOUT,
            CLOSE_TIMEOUT,
            &token,
        )
        .await
        .unwrap();

        assert_eq!(stats.sent(), b"S,CONNECT\r\n");
        session.close().await;
        assert_eq!(stats.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_timeout_leaves_no_open_socket() {
        let (factory, stats) = fake_factory(FakeBehavior::ConnectHang);
        let token = CancellationToken::new();

        let res = Session::open(
            factory(),
            addr(),
            "S,CONNECT\r\n",
            Duration::from_millis(100),
            CLOSE_TIMEOUT,
            &token,
        )
        .await;

        assert!(matches!(res, Err(ClientError::Timeout { .. })));
        assert_eq!(stats.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connect_closes_the_transport() {
        let (factory, stats) = fake_factory(FakeBehavior::RefuseConnect);
        let token = CancellationToken::new();

        let res = Session::open(
            factory(),
            addr(),
            "S,CONNECT\r\n",
            CONNECT_TIMEOUT,
            CLOSE_TIMEOUT,
            &token,
        )
        .await;

        assert!(matches!(res, Err(ClientError::Transport { .. })));
        assert_eq!(stats.connects(), 1);
        assert_eq!(stats.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_remote_times_out_the_receive() {
        let (factory, _stats) = fake_factory(FakeBehavior::Silent);
        let token = CancellationToken::new();

        let mut session = Session::open(
            factory(),
            addr(),
            "S,CONNECT\r\n",
            CONNECT_TIMEOUT,
            CLOSE_TIMEOUT,
            &token,
        )
        .await
        .unwrap();

        let res = session.await_message(Duration::from_millis(100), &token).await;
        assert!(matches!(res, Err(ClientError::Timeout { .. })));
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_read_means_remote_closed() {
        let (factory, _stats) = fake_factory(FakeBehavior::CloseAfter {
            n: 0,
            every: Duration::from_millis(10),
        });
        let token = CancellationToken::new();

        let mut session = Session::open(
            factory(),
            addr(),
            "S,CONNECT\r\n",
            CONNECT_TIMEOUT,
            CLOSE_TIMEOUT,
            &token,
        )
        .await
        .unwrap();

        let res = session.await_message(Duration::from_secs(5), &token).await;
        match res {
            Err(ClientError::Transport { message }) => {
                assert!(message.contains("closed"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn payloads_are_truncated_to_received_length() {
        let (factory, _stats) = fake_factory(FakeBehavior::Stream {
            every: Duration::from_millis(10),
        });
        let token = CancellationToken::new();

        let mut session = Session::open(
            factory(),
            addr(),
            "S,CONNECT\r\n",
            CONNECT_TIMEOUT,
            CLOSE_TIMEOUT,
            &token,
        )
        .await
        .unwrap();

        let payload = session
            .await_message(Duration::from_secs(5), &token)
            .await
            .unwrap();
        assert_eq!(payload, b"S,KEEPALIVE\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn close_twice_is_harmless() {
        let (factory, stats) = fake_factory(FakeBehavior::Silent);
        let token = CancellationToken::new();

        let mut session = Session::open(
            factory(),
            addr(),
            "S,CONNECT\r\n",
            CONNECT_TIMEOUT,
            CLOSE_TIMEOUT,
            &token,
        )
        .await
        .unwrap();

        session.close().await;
        session.close().await;
        assert_eq!(stats.closes(), 2);
    }
}
