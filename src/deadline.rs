//! # Deadline executor: a cancellable timeout combinator.
//!
//! [`run`] executes an asynchronous operation under a derived deadline while
//! honoring an outer cancellation token. It is the single primitive behind
//! every blocking socket call (connect, send, receive), each given its own
//! budget.
//!
//! ## Outcome mapping
//! ```text
//! outer already cancelled  → Err(Canceled), operation never invoked
//! outer fires mid-flight   → child cancelled → Err(Canceled)
//! deadline elapses         → child cancelled → Err(Timeout)
//! operation completes      → its result, unchanged
//! ```
//!
//! ## Rules
//! - The operation receives a **child token** derived from the outer one; it
//!   should select against `cancelled()` at its own suspension points.
//! - The select is `biased` with the outer token first: caller-requested
//!   cancellation always wins over the timer, even when both are ready.
//! - A `Canceled` bubbling out of the operation while the outer token is
//!   cancelled stays `Canceled`; it is never reinterpreted as a timeout.

use std::future::Future;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Runs `op` under `timeout`, racing it against the deadline and the outer token.
///
/// `op` is handed a child [`CancellationToken`]; when the deadline elapses or
/// the outer token fires, the child is cancelled so the operation can unwind
/// promptly. Dropping the in-flight future on either exit path releases any
/// resources it held.
///
/// ### Pre-condition
/// If `outer` is already cancelled, returns `Err(Canceled)` without invoking
/// the operation at all.
pub async fn run<T, F, Fut>(
    outer: &CancellationToken,
    timeout: Duration,
    op: F,
) -> Result<T, ClientError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    if outer.is_cancelled() {
        return Err(ClientError::Canceled);
    }

    let child = outer.child_token();
    let fut = op(child.clone());
    tokio::pin!(fut);

    let deadline = time::sleep(timeout);
    tokio::pin!(deadline);

    tokio::select! {
        biased;
        _ = outer.cancelled() => {
            child.cancel();
            Err(ClientError::Canceled)
        }
        res = &mut fut => match res {
            // The operation may observe the child token racing with the outer
            // one; outer cancellation must never be masked.
            Err(ClientError::Canceled) if outer.is_cancelled() => Err(ClientError::Canceled),
            other => other,
        },
        _ = &mut deadline => {
            child.cancel();
            Err(ClientError::Timeout { timeout })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn completes_before_deadline() {
        let token = CancellationToken::new();
        let res = run(&token, Duration::from_secs(5), |_ctx| async {
            time::sleep(Duration::from_millis(10)).await;
            Ok(42u32)
        })
        .await;
        assert_eq!(res.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_pass_through_unchanged() {
        let token = CancellationToken::new();
        let res: Result<(), _> = run(&token, Duration::from_secs(5), |_ctx| async {
            Err(ClientError::transport("connection refused"))
        })
        .await;
        assert!(matches!(res, Err(ClientError::Transport { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn overrun_reports_timeout() {
        let token = CancellationToken::new();
        let res: Result<(), _> = run(&token, Duration::from_millis(100), |ctx| async move {
            ctx.cancelled().await;
            Err(ClientError::Canceled)
        })
        .await;
        match res {
            Err(ClientError::Timeout { timeout }) => {
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pre_cancelled_token_skips_the_operation() {
        let token = CancellationToken::new();
        token.cancel();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let res: Result<(), _> = run(&token, Duration::from_secs(5), |_ctx| async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(matches!(res, Err(ClientError::Canceled)));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_over_the_deadline() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        // Operation never completes on its own; only the tokens can end it.
        let res: Result<(), _> = run(&token, Duration::from_millis(100), |ctx| async move {
            ctx.cancelled().await;
            Err(ClientError::Canceled)
        })
        .await;
        assert!(matches!(res, Err(ClientError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn child_token_fires_on_timeout() {
        let token = CancellationToken::new();
        let slot: Arc<std::sync::Mutex<Option<CancellationToken>>> =
            Arc::new(std::sync::Mutex::new(None));
        let stash = slot.clone();

        let res: Result<(), _> = run(&token, Duration::from_millis(20), |ctx| async move {
            *stash.lock().unwrap() = Some(ctx);
            std::future::pending::<Result<(), ClientError>>().await
        })
        .await;

        assert!(matches!(res, Err(ClientError::Timeout { .. })));
        let child = slot.lock().unwrap().take().unwrap();
        assert!(child.is_cancelled());
        // The outer token is untouched.
        assert!(!token.is_cancelled());
    }
}
