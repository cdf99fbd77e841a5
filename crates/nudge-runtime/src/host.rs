//! Reader side of the host channel.
//!
//! Inbound events arrive on a single stream. Responses are handed to the
//! bridge; view-change and refresh notifications are forwarded to whoever
//! drives the coordinator. When the stream ends every pending call is failed.

use nudge_core::protocol::{HostEvent, Notification};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bridge::CorrelationBridge;

/// Handle to the reader task. Dropping it does not stop the task; call
/// [`HostLink::abort`] for that.
pub struct HostLink {
    handle: JoinHandle<()>,
}

impl HostLink {
    pub fn spawn(
        mut inbound: mpsc::UnboundedReceiver<HostEvent>,
        bridge: CorrelationBridge,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            while let Some(event) = inbound.recv().await {
                match event.into_notification() {
                    Ok(notification) => {
                        if notifications.send(notification).is_err() {
                            tracing::debug!("notification receiver gone; dropping event");
                        }
                    }
                    Err(response) => {
                        bridge.route(response);
                    }
                }
            }
            let failed = bridge.fail_all();
            tracing::info!(failed, "host stream closed");
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the inbound stream to end.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            if !err.is_cancelled() {
                tracing::error!(error = %err, "host reader task failed");
            }
        }
    }
}
