//! View coordination: which view is active, what a configuration change does
//! to the open surfaces, and when the active view is polled.

use std::sync::{Arc, Mutex, PoisonError};

use nudge_core::error::Result;
use nudge_core::models::{Config, View};
use nudge_core::protocol::Notification;
use nudge_core::registry::ConfigDraft;
use tokio::task::JoinHandle;

use crate::engine::SyncEngine;
use crate::projection::{RenderHint, Tab};
use crate::scheduler::PollScheduler;

/// Shared cell holding the active view. The poll timer reads it on every tick.
#[derive(Debug, Clone)]
pub struct ActiveView(Arc<Mutex<View>>);

impl Default for ActiveView {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(View::Settings)))
    }
}

impl ActiveView {
    pub fn get(&self) -> View {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, view: View) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = view;
    }
}

/// Drives navigation, config reconciliation and polling on top of a
/// [`SyncEngine`].
pub struct ViewCoordinator {
    engine: SyncEngine,
    active: ActiveView,
    scheduler: PollScheduler,
}

impl ViewCoordinator {
    pub fn new(engine: SyncEngine) -> Self {
        Self {
            engine,
            active: ActiveView::default(),
            scheduler: PollScheduler::new(),
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn active_view(&self) -> View {
        self.active.get()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.engine.surfaces().tabs()
    }

    pub fn polling_period(&self) -> Option<std::time::Duration> {
        self.scheduler.period()
    }

    /// Startup sequence: load config, check the credential, build the tabs,
    /// enter the default view and arm polling.
    ///
    /// A failed load is reported through the error slot and startup carries
    /// on with whatever config the registry already holds.
    pub async fn start(&mut self) -> View {
        if let Err(err) = self.engine.load_config().await {
            tracing::warn!(error = %err, "config load failed; continuing with current config");
        }
        if let Err(err) = self.engine.refresh_credential_status().await {
            tracing::warn!(error = %err, "credential status unavailable");
        }
        self.rebuild_surfaces();
        let view = self.engine.registry().default_view();
        self.enter(view.clone());
        self.rearm_polling();
        tracing::info!(%view, "started");
        view
    }

    /// Switch to `target`, falling back to settings when it is not an
    /// enabled source. Entering a source view issues its read.
    pub fn navigate(&self, target: &str) -> View {
        let view = self.engine.registry().resolve_view(target);
        if view.is_settings() && !View::parse(target).is_settings() {
            tracing::debug!(target, "unknown view; falling back to settings");
        }
        self.enter(view.clone());
        view
    }

    /// Re-read the active view. `None` on the settings view.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        let key = self.active.get().source_key()?.clone();
        Some(self.engine.spawn_refresh(key))
    }

    /// Save `config`, reconcile the surfaces and re-arm polling.
    ///
    /// The active source stays active (and is re-read) when it is still
    /// enabled; otherwise the default view is entered. Nothing changes when
    /// the save fails.
    pub async fn save_config(&mut self, config: Config) -> Result<View> {
        self.engine.save_config(config).await?;
        self.rebuild_surfaces();

        let current = self.active.get();
        let view = match current.source_key() {
            Some(key) if self.engine.surfaces().contains(key) => current,
            _ => self.engine.registry().default_view(),
        };
        self.enter(view.clone());
        self.rearm_polling();
        Ok(view)
    }

    /// Save an editing session. Keys are assigned to new drafts in place, so
    /// saving the same draft twice keeps them.
    pub async fn save_draft(&mut self, draft: &mut ConfigDraft) -> Result<View> {
        let base = self.engine.registry().snapshot();
        let config = draft.to_config(&base);
        self.save_config(config).await
    }

    pub fn handle_notification(&self, notification: Notification) {
        match notification {
            Notification::ViewChange(target) if target.trim().is_empty() => {
                tracing::debug!("ignoring view change without a target");
            }
            Notification::ViewChange(target) => {
                self.navigate(&target);
            }
            Notification::Refresh => {
                self.refresh();
            }
        }
    }

    /// Tear down the timer and start a fresh one at the current config's
    /// interval, so the next tick is one full period away.
    pub fn rearm_polling(&mut self) {
        let period = self.engine.registry().snapshot().poll_interval();
        let engine = self.engine.clone();
        let active = self.active.clone();
        self.scheduler.start(period, move || {
            if let View::Source(key) = active.get() {
                engine.spawn_refresh(key);
            }
        });
        tracing::info!(?period, "polling armed");
    }

    pub fn shutdown(&mut self) {
        self.scheduler.stop();
    }

    fn rebuild_surfaces(&self) {
        let tabs = self
            .engine
            .surfaces()
            .rebuild(&self.engine.registry().enabled_sources());
        self.engine.hints().emit(RenderHint::Tabs(tabs));
    }

    fn enter(&self, view: View) {
        self.active.set(view.clone());
        self.engine.hints().emit(RenderHint::ActiveView(view.clone()));
        if let View::Source(key) = view {
            self.engine.spawn_refresh(key);
        }
    }
}
