//! Correlation bridge: point-to-point calls over a shared, one-way channel.
//!
//! Each call mints a token, parks a `oneshot` sender under it and writes the
//! request exactly once. The host link's reader hands every inbound response
//! to [`CorrelationBridge::route`], which wakes the single waiter registered
//! for that token. Waiters are removed on response, on timeout, and when the
//! calling future is dropped, so nothing outlives its call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use nudge_core::error::{NudgeError, Result};
use nudge_core::protocol::{Action, CorrelationId, InboundResponse, OutboundRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Wait applied when no explicit timeout is configured.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

type Waiter = oneshot::Sender<InboundResponse>;

struct BridgeInner {
    outbound: mpsc::UnboundedSender<OutboundRequest>,
    pending: Mutex<HashMap<CorrelationId, Waiter>>,
    next_seq: AtomicU64,
    timeout: Duration,
}

impl BridgeInner {
    fn pending(&self) -> MutexGuard<'_, HashMap<CorrelationId, Waiter>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deregisters a waiter when its call ends for any reason.
struct PendingGuard<'a> {
    inner: &'a BridgeInner,
    id: CorrelationId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending().remove(&self.id);
    }
}

/// Cloneable handle; all clones share the same pending table.
#[derive(Clone)]
pub struct CorrelationBridge {
    inner: Arc<BridgeInner>,
}

impl CorrelationBridge {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundRequest>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                outbound,
                pending: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
                timeout,
            }),
        }
    }

    /// Bridge plus the receiving end of its outbound channel.
    pub fn channel(timeout: Duration) -> (Self, mpsc::UnboundedReceiver<OutboundRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, timeout), rx)
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Number of calls still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// Millisecond timestamp plus a process-wide counter. Only uniqueness
    /// matters; the timestamp keeps tokens distinct across restarts.
    fn mint_id(&self) -> CorrelationId {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        CorrelationId::from(format!("{}-{}", Utc::now().timestamp_millis(), seq))
    }

    /// Issue `action` and wait for its response.
    ///
    /// Fails with [`NudgeError::Remote`] on `ok: false`, with
    /// [`NudgeError::Timeout`] when nothing arrives within the bounded wait,
    /// and with [`NudgeError::ChannelClosed`] when either side of the channel
    /// is gone. Never retries.
    pub async fn call(&self, action: Action, payload: Value) -> Result<Value> {
        let id = self.mint_id();
        let (tx, rx) = oneshot::channel();
        self.inner.pending().insert(id.clone(), tx);
        let _guard = PendingGuard {
            inner: &self.inner,
            id: id.clone(),
        };

        tracing::debug!(%id, %action, "dispatching call");
        let request = OutboundRequest {
            id: id.clone(),
            action,
            payload,
        };
        if self.inner.outbound.send(request).is_err() {
            return Err(NudgeError::ChannelClosed);
        }

        match tokio::time::timeout(self.inner.timeout, rx).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(_)) => Err(NudgeError::ChannelClosed),
            Err(_) => {
                tracing::warn!(%id, %action, timeout = ?self.inner.timeout, "call timed out");
                Err(NudgeError::Timeout {
                    action,
                    after: self.inner.timeout,
                })
            }
        }
    }

    /// [`call`](Self::call) with a typed payload and result.
    ///
    /// A `null` or absent result decodes to `T::default()`, matching the
    /// collaborator's habit of omitting empty values.
    pub async fn call_typed<P, T>(&self, action: Action, payload: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let payload = serde_json::to_value(payload)?;
        let value = self.call(action, payload).await?;
        if value.is_null() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Deliver `response` to its waiter.
    ///
    /// Returns `false` when no call is waiting on that token (already
    /// answered, timed out, or never issued); such responses are dropped.
    pub fn route(&self, response: InboundResponse) -> bool {
        let waiter = self.inner.pending().remove(&response.id);
        match waiter {
            Some(tx) => {
                let id = response.id.clone();
                if tx.send(response).is_err() {
                    tracing::debug!(%id, "waiter dropped before response arrived");
                    return false;
                }
                true
            }
            None => {
                tracing::warn!(id = %response.id, "discarding response with no pending call");
                false
            }
        }
    }

    /// Fail every pending call with [`NudgeError::ChannelClosed`].
    pub fn fail_all(&self) -> usize {
        let drained: Vec<Waiter> = self.inner.pending().drain().map(|(_, tx)| tx).collect();
        drained.len()
    }
}
