//! Single-flight access token renewal
//!
//! At most one exchange with the refresh endpoint runs at a time. The first
//! caller to need a new token starts the exchange and parks a shared handle
//! to it; every caller arriving while it runs awaits that same handle. When
//! the exchange settles the slot is emptied, so the next 401 starts afresh.

use crate::request::REFRESH_PATH;
use crate::session::SessionStore;
use crate::types::{RefreshRequest, RefreshResponse};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{info, warn};

/// Why a refresh exchange failed; shared by every waiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure(pub String);

pub type RefreshOutcome = Result<String, RefreshFailure>;

type SharedExchange = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InFlight {
    id: u64,
    exchange: SharedExchange,
}

type Slot = Mutex<Option<InFlight>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<InFlight>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Empties the slot when its exchange settles or is dropped
struct SettleGuard {
    slot: Weak<Slot>,
    id: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.upgrade() {
            let mut in_flight = lock(&slot);
            if in_flight.as_ref().is_some_and(|f| f.id == self.id) {
                *in_flight = None;
            }
        }
    }
}

/// Guards the process-wide "refresh in flight" slot
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Arc<Slot>,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the running exchange, or start one with `start` if none runs.
    ///
    /// Returns the shared exchange and whether this call started it.
    pub fn join_or_start<F>(&self, start: F) -> (SharedExchange, bool)
    where
        F: FnOnce() -> BoxFuture<'static, RefreshOutcome>,
    {
        let mut in_flight = lock(&self.slot);
        if let Some(running) = in_flight.as_ref() {
            return (running.exchange.clone(), false);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = SettleGuard {
            slot: Arc::downgrade(&self.slot),
            id,
        };
        let exchange = start();
        let exchange = async move {
            let _settle = guard;
            exchange.await
        }
        .boxed()
        .shared();

        *in_flight = Some(InFlight {
            id,
            exchange: exchange.clone(),
        });
        (exchange, true)
    }

    pub fn in_flight(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

/// Exchange `refresh_token` for a new access token and store it in the session
pub(crate) async fn exchange_refresh_token(
    http: reqwest::Client,
    base_url: String,
    refresh_token: String,
    timeout: Duration,
    session: Arc<dyn SessionStore>,
) -> RefreshOutcome {
    info!("Refreshing access token");

    let call = async {
        let response = http
            .post(format!("{base_url}{REFRESH_PATH}"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| RefreshFailure(format!("refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshFailure(format!("refresh rejected with status {status}")));
        }

        response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| RefreshFailure(format!("invalid refresh response: {e}")))
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(RefreshResponse { access_token })) => {
            session.set_access_token(access_token.clone());
            info!("Access token refreshed");
            Ok(access_token)
        }
        Ok(Err(failure)) => {
            warn!(reason = %failure.0, "Token refresh failed");
            Err(failure)
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis(), "Token refresh timed out");
            Err(RefreshFailure(format!(
                "refresh timed out after {}ms",
                timeout.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let coordinator = RefreshCoordinator::new();
        let (tx, rx) = oneshot::channel::<()>();
        let mut starts = 0;

        let (first, started) = coordinator.join_or_start(|| {
            starts += 1;
            async move {
                let _ = rx.await;
                Ok::<_, RefreshFailure>("token-1".to_string())
            }
            .boxed()
        });
        assert!(started);
        assert!(coordinator.in_flight());

        let (second, started) = coordinator.join_or_start(|| {
            starts += 1;
            async { Ok::<_, RefreshFailure>("token-2".to_string()) }.boxed()
        });
        assert!(!started);

        tx.send(()).unwrap();
        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Ok("token-1".to_string()));
        assert_eq!(b, Ok("token-1".to_string()));
        assert_eq!(starts, 1);
        assert!(!coordinator.in_flight());
    }

    #[tokio::test]
    async fn test_slot_cleared_after_failure() {
        let coordinator = RefreshCoordinator::new();
        let (exchange, _) = coordinator
            .join_or_start(|| async { Err::<String, _>(RefreshFailure("rejected".into())) }.boxed());
        assert_eq!(exchange.await, Err(RefreshFailure("rejected".into())));
        assert!(!coordinator.in_flight());

        let (exchange, started) =
            coordinator.join_or_start(|| async { Ok::<_, RefreshFailure>("again".to_string()) }.boxed());
        assert!(started);
        assert_eq!(exchange.await, Ok("again".to_string()));
    }

    #[tokio::test]
    async fn test_abandoned_exchange_is_resumed() {
        let coordinator = RefreshCoordinator::new();
        let (tx, rx) = oneshot::channel::<()>();
        let (exchange, _) = coordinator.join_or_start(|| {
            async move {
                let _ = rx.await;
                Ok::<_, RefreshFailure>("late".to_string())
            }
            .boxed()
        });
        drop(exchange);
        assert!(coordinator.in_flight());

        let (exchange, started) =
            coordinator.join_or_start(|| async { Ok::<_, RefreshFailure>("duplicate".to_string()) }.boxed());
        assert!(!started);
        tx.send(()).unwrap();
        assert_eq!(exchange.await, Ok("late".to_string()));
        assert!(!coordinator.in_flight());
    }
}
