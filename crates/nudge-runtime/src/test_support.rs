//! Scripted host collaborator and harness shared by the runtime tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use nudge_core::models::{Config, SourceConfig, SourceKind, SourceProfile};
use nudge_core::protocol::{Action, InboundResponse, OutboundRequest};
use nudge_core::registry::EntityRegistry;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bridge::CorrelationBridge;
use crate::engine::SyncEngine;
use crate::projection::{HintSink, RenderHint};

pub(crate) const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How the fake host answers one request.
pub(crate) enum Reply {
    Ok(Value),
    Fail(&'static str),
    /// Never answer.
    Silent,
}

impl Reply {
    pub(crate) fn config(config: &Config) -> Self {
        Reply::Ok(serde_json::to_value(config).expect("config serializes"))
    }
}

/// Records every outbound request and answers it through the bridge.
pub(crate) struct FakeHost {
    log: Arc<Mutex<Vec<OutboundRequest>>>,
    task: JoinHandle<()>,
}

impl FakeHost {
    pub(crate) fn spawn<F>(
        mut outbound: mpsc::UnboundedReceiver<OutboundRequest>,
        bridge: CorrelationBridge,
        mut responder: F,
    ) -> Self
    where
        F: FnMut(&OutboundRequest) -> Reply + Send + 'static,
    {
        let log = Arc::new(Mutex::new(Vec::new()));
        let task = {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                while let Some(request) = outbound.recv().await {
                    log.lock().unwrap().push(request.clone());
                    match responder(&request) {
                        Reply::Ok(data) => {
                            bridge.route(InboundResponse::success(request.id, data));
                        }
                        Reply::Fail(message) => {
                            bridge.route(InboundResponse::failure(request.id, message));
                        }
                        Reply::Silent => {}
                    }
                }
            })
        };
        Self { log, task }
    }

    pub(crate) fn requests(&self) -> Vec<OutboundRequest> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn actions(&self) -> Vec<Action> {
        self.requests().into_iter().map(|r| r.action).collect()
    }

    pub(crate) fn payloads(&self, action: Action) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.action == action)
            .map(|r| r.payload)
            .collect()
    }

    pub(crate) fn count(&self, action: Action) -> usize {
        self.requests().iter().filter(|r| r.action == action).count()
    }

    /// Yield until at least `n` requests of `action` were seen.
    pub(crate) async fn wait_for(&self, action: Action, n: usize) {
        for _ in 0..10_000 {
            if self.count(action) >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} {action} request(s), saw {}", self.count(action));
    }
}

impl Drop for FakeHost {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An engine wired to a [`FakeHost`].
pub(crate) struct Harness {
    pub engine: SyncEngine,
    pub host: FakeHost,
    pub hints: mpsc::UnboundedReceiver<RenderHint>,
}

impl Harness {
    pub(crate) fn start<F>(config: Config, responder: F) -> Self
    where
        F: FnMut(&OutboundRequest) -> Reply + Send + 'static,
    {
        Self::start_with_timeout(config, TEST_TIMEOUT, responder)
    }

    pub(crate) fn start_with_timeout<F>(config: Config, timeout: Duration, responder: F) -> Self
    where
        F: FnMut(&OutboundRequest) -> Reply + Send + 'static,
    {
        let (bridge, outbound) = CorrelationBridge::channel(timeout);
        let host = FakeHost::spawn(outbound, bridge.clone(), responder);
        let (sink, hints) = HintSink::channel();
        let engine = SyncEngine::new(bridge, Arc::new(EntityRegistry::new(config)), sink);
        Self {
            engine,
            host,
            hints,
        }
    }
}

/// A config with one enabled task source `db-1`.
pub(crate) fn task_config(status_done: &str) -> Config {
    let mut source = SourceConfig::new("db-1", "Tasks", SourceKind::Task);
    if let SourceProfile::Task(task) = &mut source.profile {
        task.status_done = status_done.to_string();
    }
    Config {
        databases: vec![source],
        ..Config::default()
    }
}

pub(crate) fn drain_hints(rx: &mut mpsc::UnboundedReceiver<RenderHint>) -> Vec<RenderHint> {
    let mut hints = Vec::new();
    while let Ok(hint) = rx.try_recv() {
        hints.push(hint);
    }
    hints
}

/// Wait for the next hint matching `pred`, skipping others.
pub(crate) async fn wait_hint<F>(rx: &mut mpsc::UnboundedReceiver<RenderHint>, mut pred: F) -> RenderHint
where
    F: FnMut(&RenderHint) -> bool,
{
    let found = tokio::time::timeout(TEST_TIMEOUT, async {
        loop {
            match rx.recv().await {
                Some(hint) if pred(&hint) => return hint,
                Some(_) => continue,
                None => panic!("hint channel closed"),
            }
        }
    })
    .await;
    found.expect("expected render hint was not emitted")
}
