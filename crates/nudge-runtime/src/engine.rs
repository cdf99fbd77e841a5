//! Source-scoped reads and writes, with error projection and the optimistic
//! habit-completion path.
//!
//! Every public operation validates locally first (nothing is dispatched on a
//! validation failure), clears the error slot when its call starts, and
//! writes the slot if anything fails. Reads replace the surface's items only
//! if the surface still exists when the response lands.

use std::sync::Arc;

use nudge_core::error::{NudgeError, Result};
use nudge_core::models::{
    Config, Item, SourceConfig, SourceKey, SourceKind, StatusAction, MASKED_TOKEN,
};
use nudge_core::protocol::{
    Action, OpenUrlPayload, ResolvePayload, SourcePayload, TokenPayload, UpdateHabitPayload,
    UpdateStatusPayload,
};
use nudge_core::registry::EntityRegistry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::bridge::CorrelationBridge;
use crate::projection::{ControlState, HintSink, RenderHint, StatusProjection};
use crate::surfaces::SurfaceTable;

/// Action & polling engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SyncEngine {
    bridge: CorrelationBridge,
    registry: Arc<EntityRegistry>,
    surfaces: SurfaceTable,
    status: StatusProjection,
    hints: HintSink,
}

impl SyncEngine {
    pub fn new(bridge: CorrelationBridge, registry: Arc<EntityRegistry>, hints: HintSink) -> Self {
        Self {
            bridge,
            registry,
            surfaces: SurfaceTable::default(),
            status: StatusProjection::new(hints.clone()),
            hints,
        }
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    pub fn surfaces(&self) -> &SurfaceTable {
        &self.surfaces
    }

    pub fn status(&self) -> &StatusProjection {
        &self.status
    }

    pub fn hints(&self) -> &HintSink {
        &self.hints
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// In-progress items of a task source.
    pub async fn list_tasks(&self, key: &SourceKey) -> Result<Vec<Item>> {
        let source = self.report(self.source_of_kind(key, SourceKind::Task))?;
        self.read(&source).await
    }

    /// Today's habit instances of a habit source.
    pub async fn list_habits(&self, key: &SourceKey) -> Result<Vec<Item>> {
        let source = self.report(self.source_of_kind(key, SourceKind::Habit))?;
        self.read(&source).await
    }

    /// Read `key` with whichever operation its kind calls for.
    pub async fn refresh(&self, key: &SourceKey) -> Result<Vec<Item>> {
        let source = self.report(self.enabled_source(key))?;
        self.read(&source).await
    }

    /// [`refresh`](Self::refresh) as a detached task. The outcome lands in
    /// the surfaces and the error slot.
    pub fn spawn_refresh(&self, key: SourceKey) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let _ = engine.refresh(&key).await;
        })
    }

    async fn read(&self, source: &SourceConfig) -> Result<Vec<Item>> {
        let kind = source.kind();
        let action = match kind {
            SourceKind::Task => Action::GetTasks,
            SourceKind::Habit => Action::GetHabits,
        };
        let payload = SourcePayload {
            database_key: source.key.clone(),
        };
        let items: Vec<Item> = self.report(self.call(action, &payload).await)?;

        match self.surfaces.apply_items(&source.key, items.clone()) {
            Some(updated_at) => self.hints.emit(RenderHint::Items {
                key: source.key.clone(),
                kind,
                items: items.clone(),
                updated_at,
            }),
            None => tracing::debug!(key = %source.key, "view gone; discarding read result"),
        }
        Ok(items)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Move a task to the status configured for `action`, then re-read the
    /// source for the authoritative result.
    pub async fn set_task_status(
        &self,
        key: &SourceKey,
        item_id: &str,
        action: StatusAction,
    ) -> Result<()> {
        let source = self.report(self.validate_status_action(key, item_id, action))?;
        let payload = UpdateStatusPayload {
            database_key: source.key.clone(),
            task_id: item_id.to_string(),
            action,
        };
        self.report(self.call::<_, Value>(Action::UpdateStatus, &payload).await)?;
        tracing::info!(key = %source.key, item_id, %action, "task status updated");
        self.read(&source).await?;
        Ok(())
    }

    /// Complete a habit for today.
    ///
    /// The control is disabled before the call and re-enabled if it fails.
    /// A second request for an item already in flight is ignored.
    pub async fn mark_habit_done(&self, key: &SourceKey, item_id: &str) -> Result<()> {
        let source = self.report(self.validate_habit_item(key, item_id))?;
        if !self.surfaces.begin_submit(key, item_id) {
            tracing::debug!(%key, item_id, "completion already in flight");
            return Ok(());
        }
        self.emit_control(key, item_id, ControlState::Pending);

        let payload = UpdateHabitPayload {
            database_key: source.key.clone(),
            task_id: item_id.to_string(),
            checked: true,
        };
        let result = self.call::<_, Value>(Action::UpdateHabitCheck, &payload).await;
        self.surfaces.end_submit(key, item_id);

        match result {
            Ok(_) => {
                self.surfaces.mark_checked(key, item_id);
                self.emit_control(key, item_id, ControlState::Checked);
                self.read(&source).await?;
                Ok(())
            }
            Err(err) => {
                self.emit_control(key, item_id, ControlState::Enabled);
                Err(self.fail(err))
            }
        }
    }

    // ── Metadata lookups ──────────────────────────────────────────────────

    pub async fn resolve_data_source_id(&self, database_id: &str) -> Result<String> {
        let payload = self.report(resolve_payload(database_id))?;
        self.report(self.call(Action::ResolveDataSourceId, &payload).await)
    }

    pub async fn resolve_title_property_name(&self, database_id: &str) -> Result<String> {
        let payload = self.report(resolve_payload(database_id))?;
        self.report(self.call(Action::ResolveTitlePropertyName, &payload).await)
    }

    pub async fn open_external(&self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(self.fail(NudgeError::EmptyIdentifier("url")));
        }
        let payload = OpenUrlPayload {
            url: url.to_string(),
        };
        self.report(self.call::<_, Value>(Action::OpenUrl, &payload).await)?;
        Ok(())
    }

    // ── Configuration ─────────────────────────────────────────────────────

    /// Fetch the stored config and make it current.
    pub async fn load_config(&self) -> Result<Arc<Config>> {
        let config: Config = self.report(self.call(Action::GetConfig, &json!({})).await)?;
        Ok(self.registry.replace(config))
    }

    /// Persist `config` and, once the collaborator accepts it, swap it in.
    ///
    /// The echoed config is preferred when the collaborator returns one.
    pub async fn save_config(&self, config: Config) -> Result<Arc<Config>> {
        let config = config.normalize();
        self.report(config.validate())?;
        let echoed: Value = self.report(self.call(Action::SaveConfig, &config).await)?;
        let saved = if echoed.is_object() {
            self.report(serde_json::from_value::<Config>(echoed).map_err(NudgeError::from))?
        } else {
            config
        };
        tracing::info!(sources = saved.databases.len(), "config saved");
        Ok(self.registry.replace(saved))
    }

    // ── Credential ────────────────────────────────────────────────────────

    pub async fn refresh_credential_status(&self) -> Result<bool> {
        let present: bool = self.report(self.call(Action::GetTokenStatus, &json!({})).await)?;
        self.status.set_credential(present);
        Ok(present)
    }

    pub async fn set_credential(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() || token == MASKED_TOKEN {
            return Err(self.fail(NudgeError::EmptyToken));
        }
        let payload = TokenPayload {
            token: token.to_string(),
        };
        self.report(self.call::<_, Value>(Action::SetToken, &payload).await)?;
        self.status.set_credential(true);
        Ok(())
    }

    pub async fn clear_credential(&self) -> Result<()> {
        self.report(self.call::<_, Value>(Action::ClearToken, &json!({})).await)?;
        self.status.set_credential(false);
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// Clear the error slot and issue one call.
    async fn call<P, T>(&self, action: Action, payload: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        self.status.clear_error();
        self.bridge.call_typed(action, payload).await
    }

    fn fail(&self, err: NudgeError) -> NudgeError {
        self.status.set_error(&err);
        err
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|err| self.fail(err))
    }

    fn emit_control(&self, key: &SourceKey, item_id: &str, state: ControlState) {
        self.hints.emit(RenderHint::HabitControl {
            key: key.clone(),
            item_id: item_id.to_string(),
            state,
        });
    }

    fn enabled_source(&self, key: &SourceKey) -> Result<SourceConfig> {
        let source = self
            .registry
            .source(key)
            .ok_or_else(|| NudgeError::UnknownSource(key.clone()))?;
        if !source.enabled {
            return Err(NudgeError::SourceDisabled(key.clone()));
        }
        Ok(source)
    }

    fn source_of_kind(&self, key: &SourceKey, expected: SourceKind) -> Result<SourceConfig> {
        let source = self.enabled_source(key)?;
        if source.kind() != expected {
            return Err(NudgeError::KindMismatch { expected });
        }
        Ok(source)
    }

    fn validate_status_action(
        &self,
        key: &SourceKey,
        item_id: &str,
        action: StatusAction,
    ) -> Result<SourceConfig> {
        if item_id.trim().is_empty() {
            return Err(NudgeError::EmptyIdentifier("task_id"));
        }
        let source = self.source_of_kind(key, SourceKind::Task)?;
        let configured = source.task().is_some_and(|task| task.can(action));
        if !configured {
            return Err(NudgeError::StatusNotConfigured(action));
        }
        Ok(source)
    }

    fn validate_habit_item(&self, key: &SourceKey, item_id: &str) -> Result<SourceConfig> {
        if item_id.trim().is_empty() {
            return Err(NudgeError::EmptyIdentifier("task_id"));
        }
        self.source_of_kind(key, SourceKind::Habit)
    }
}

fn resolve_payload(database_id: &str) -> Result<ResolvePayload> {
    let database_id = database_id.trim();
    if database_id.is_empty() {
        return Err(NudgeError::EmptyIdentifier("database_id"));
    }
    Ok(ResolvePayload {
        database_id: database_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{drain_hints, task_config, Harness, Reply};

    fn habit_config() -> Config {
        Config {
            databases: vec![SourceConfig::new("db-h", "Habits", SourceKind::Habit)],
            ..Config::default()
        }
    }

    // ── reads ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_tasks_replaces_surface_items() {
        let h = Harness::start(task_config("Done"), |req| match req.action {
            Action::GetTasks => Reply::Ok(json!([{ "id": "t1", "title": "Write spec" }])),
            _ => Reply::Ok(Value::Null),
        });
        let key = SourceKey::from("db-1");
        h.engine.surfaces().rebuild(&h.engine.registry().enabled_sources());

        let items = h.engine.list_tasks(&key).await.unwrap();
        assert_eq!(items, vec![Item::new("t1", "Write spec")]);
        let surface = h.engine.surfaces().get(&key).unwrap();
        assert_eq!(surface.items.len(), 1);
        assert!(surface.updated_at.is_some());
        assert_eq!(h.host.payloads(Action::GetTasks), vec![json!({ "database_key": "db-1" })]);
    }

    #[tokio::test]
    async fn test_null_read_result_is_empty() {
        let h = Harness::start(habit_config(), |_| Reply::Ok(Value::Null));
        let items = h.engine.list_habits(&SourceKey::from("db-h")).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_rejected_locally() {
        let h = Harness::start(habit_config(), |_| Reply::Ok(json!([])));
        let err = h.engine.list_tasks(&SourceKey::from("db-h")).await.unwrap_err();
        assert!(matches!(err, NudgeError::KindMismatch { expected: SourceKind::Task }));
        assert!(h.host.requests().is_empty());
        assert_eq!(h.engine.status().error().as_deref(), Some("database kind is not task"));
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_sources_rejected() {
        let mut cfg = task_config("Done");
        cfg.databases[0].enabled = false;
        let h = Harness::start(cfg, |_| Reply::Ok(json!([])));
        assert!(matches!(
            h.engine.refresh(&SourceKey::from("db-1")).await,
            Err(NudgeError::SourceDisabled(_))
        ));
        assert!(matches!(
            h.engine.refresh(&SourceKey::from("nope")).await,
            Err(NudgeError::UnknownSource(_))
        ));
        assert!(h.host.requests().is_empty());
    }

    #[tokio::test]
    async fn test_read_for_torn_down_view_is_discarded() {
        let h = Harness::start(task_config("Done"), |_| Reply::Ok(json!([{ "id": "t1" }])));
        // No surface was built for db-1.
        let items = h.engine.list_tasks(&SourceKey::from("db-1")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(h.engine.surfaces().get(&SourceKey::from("db-1")).is_none());
    }

    // ── task status ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_status_action_gated_on_configured_target() {
        let h = Harness::start(task_config(""), |_| Reply::Ok(Value::Null));
        let err = h
            .engine
            .set_task_status(&SourceKey::from("db-1"), "t1", StatusAction::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, NudgeError::StatusNotConfigured(StatusAction::Done)));
        assert!(h.host.requests().is_empty());
        assert!(h.engine.status().error().is_some());
    }

    #[tokio::test]
    async fn test_status_update_rereads_without_optimistic_removal() {
        let h = Harness::start(task_config("Done"), |req| match req.action {
            Action::GetTasks => Reply::Ok(json!([{ "id": "t2", "title": "Still open" }])),
            _ => Reply::Ok(Value::Null),
        });
        let key = SourceKey::from("db-1");
        h.engine.surfaces().rebuild(&h.engine.registry().enabled_sources());

        h.engine
            .set_task_status(&key, "t1", StatusAction::Done)
            .await
            .unwrap();

        assert_eq!(h.host.actions(), vec![Action::UpdateStatus, Action::GetTasks]);
        assert_eq!(
            h.host.payloads(Action::UpdateStatus),
            vec![json!({ "database_key": "db-1", "task_id": "t1", "action": "done" })]
        );
        let surface = h.engine.surfaces().get(&key).unwrap();
        assert_eq!(surface.items[0].id, "t2");
    }

    #[tokio::test]
    async fn test_failed_status_update_surfaces_remote_error() {
        let h = Harness::start(task_config("Done"), |req| match req.action {
            Action::UpdateStatus => Reply::Fail("status option not found"),
            _ => Reply::Ok(json!([])),
        });
        let err = h
            .engine
            .set_task_status(&SourceKey::from("db-1"), "t1", StatusAction::Done)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "status option not found");
        assert_eq!(h.engine.status().error().as_deref(), Some("status option not found"));
        assert_eq!(h.host.actions(), vec![Action::UpdateStatus]);
    }

    // ── habit completion ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_mark_habit_done_rolls_back_on_failure() {
        let mut h = Harness::start(habit_config(), |req| match req.action {
            Action::UpdateHabitCheck => Reply::Fail("checkbox property not found"),
            _ => Reply::Ok(json!([{ "id": "x", "title": "Stretch" }])),
        });
        let key = SourceKey::from("db-h");
        h.engine.surfaces().rebuild(&h.engine.registry().enabled_sources());
        h.engine.list_habits(&key).await.unwrap();
        drain_hints(&mut h.hints);

        let err = h.engine.mark_habit_done(&key, "x").await.unwrap_err();
        assert_eq!(err.to_string(), "checkbox property not found");

        let surface = h.engine.surfaces().get(&key).unwrap();
        assert_eq!(surface.control_state("x"), ControlState::Enabled);
        assert!(!surface.items[0].checked);
        assert_eq!(
            h.engine.status().error().as_deref(),
            Some("checkbox property not found")
        );

        let hints = drain_hints(&mut h.hints);
        let controls: Vec<ControlState> = hints
            .iter()
            .filter_map(|hint| match hint {
                RenderHint::HabitControl { state, .. } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(controls, vec![ControlState::Pending, ControlState::Enabled]);
        // The revert is published before the error.
        let revert = hints
            .iter()
            .position(|hint| {
                matches!(hint, RenderHint::HabitControl { state: ControlState::Enabled, .. })
            })
            .unwrap();
        let error = hints
            .iter()
            .position(|hint| matches!(hint, RenderHint::Error(Some(_))))
            .unwrap();
        assert!(revert < error);
    }

    fn control_hints(hints: &[RenderHint]) -> Vec<ControlState> {
        hints
            .iter()
            .filter_map(|hint| match hint {
                RenderHint::HabitControl { state, .. } => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_habit_done_rolls_back_on_timeout() {
        let after = std::time::Duration::from_millis(50);
        let mut h = Harness::start_with_timeout(habit_config(), after, |req| match req.action {
            Action::UpdateHabitCheck => Reply::Silent,
            _ => Reply::Ok(json!([{ "id": "x", "title": "Stretch" }])),
        });
        let key = SourceKey::from("db-h");
        h.engine.surfaces().rebuild(&h.engine.registry().enabled_sources());
        h.engine.list_habits(&key).await.unwrap();
        drain_hints(&mut h.hints);

        let err = h.engine.mark_habit_done(&key, "x").await.unwrap_err();
        assert!(matches!(err, NudgeError::Timeout { action: Action::UpdateHabitCheck, .. }));

        let surface = h.engine.surfaces().get(&key).unwrap();
        assert_eq!(surface.control_state("x"), ControlState::Enabled);
        assert!(!surface.items[0].checked);
        let expected = NudgeError::Timeout {
            action: Action::UpdateHabitCheck,
            after,
        }
        .to_string();
        assert_eq!(h.engine.status().error(), Some(expected));
        assert_eq!(
            control_hints(&drain_hints(&mut h.hints)),
            vec![ControlState::Pending, ControlState::Enabled]
        );
        // No re-read after a failed completion.
        assert_eq!(h.host.count(Action::GetHabits), 1);
    }

    #[tokio::test]
    async fn test_invalid_completion_touches_no_control() {
        let mut cfg = habit_config();
        cfg.databases
            .push(SourceConfig::new("db-t", "Tasks", SourceKind::Task));
        let mut h = Harness::start(cfg, |_| Reply::Ok(Value::Null));
        h.engine.surfaces().rebuild(&h.engine.registry().enabled_sources());

        let err = h
            .engine
            .mark_habit_done(&SourceKey::from("db-h"), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, NudgeError::EmptyIdentifier("task_id")));

        let err = h
            .engine
            .mark_habit_done(&SourceKey::from("db-t"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, NudgeError::KindMismatch { expected: SourceKind::Habit }));

        assert!(h.host.requests().is_empty());
        assert!(control_hints(&drain_hints(&mut h.hints)).is_empty());
        assert_eq!(
            h.engine.status().error().as_deref(),
            Some("database kind is not habit")
        );
    }

    #[tokio::test]
    async fn test_mark_habit_done_success_rereads() {
        let h = Harness::start(habit_config(), |req| match req.action {
            Action::GetHabits => Reply::Ok(json!([])),
            _ => Reply::Ok(Value::Null),
        });
        let key = SourceKey::from("db-h");
        h.engine.surfaces().rebuild(&h.engine.registry().enabled_sources());

        h.engine.mark_habit_done(&key, "x").await.unwrap();
        assert_eq!(h.host.actions(), vec![Action::UpdateHabitCheck, Action::GetHabits]);
        assert_eq!(
            h.host.payloads(Action::UpdateHabitCheck),
            vec![json!({ "database_key": "db-h", "task_id": "x", "checked": true })]
        );
        assert!(h.engine.status().error().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_completion_is_not_dispatched() {
        let h = Harness::start(habit_config(), |req| match req.action {
            Action::UpdateHabitCheck => Reply::Silent,
            _ => Reply::Ok(json!([])),
        });
        let key = SourceKey::from("db-h");
        h.engine.surfaces().rebuild(&h.engine.registry().enabled_sources());

        let first = {
            let engine = h.engine.clone();
            let key = key.clone();
            tokio::spawn(async move { engine.mark_habit_done(&key, "x").await })
        };
        h.host.wait_for(Action::UpdateHabitCheck, 1).await;

        h.engine.mark_habit_done(&key, "x").await.unwrap();
        assert_eq!(h.host.count(Action::UpdateHabitCheck), 1);
        first.abort();
    }

    // ── metadata & misc ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_resolve_requires_database_id() {
        let h = Harness::start(Config::default(), |_| Reply::Ok(json!("ds-1")));
        let err = h.engine.resolve_data_source_id("   ").await.unwrap_err();
        assert!(err.is_validation());
        assert!(h.host.requests().is_empty());

        let id = h.engine.resolve_data_source_id(" db-abc ").await.unwrap();
        assert_eq!(id, "ds-1");
        assert_eq!(
            h.host.payloads(Action::ResolveDataSourceId),
            vec![json!({ "database_id": "db-abc" })]
        );
        assert!(h.engine.status().error().is_none());
    }

    #[tokio::test]
    async fn test_resolve_title_failure_has_no_side_effects() {
        let h = Harness::start(task_config("Done"), |_| Reply::Fail("object_not_found"));
        let before = h.engine.registry().snapshot();
        let err = h.engine.resolve_title_property_name("abc").await.unwrap_err();
        assert_eq!(err.to_string(), "object_not_found");
        assert_eq!(*h.engine.registry().snapshot(), *before);
        assert_eq!(h.engine.status().error().as_deref(), Some("object_not_found"));
    }

    #[tokio::test]
    async fn test_successful_call_clears_previous_error() {
        let h = Harness::start(Config::default(), |_| Reply::Ok(Value::Null));
        h.engine.open_external("").await.unwrap_err();
        assert!(h.engine.status().error().is_some());
        h.engine.open_external("https://example.com").await.unwrap();
        assert!(h.engine.status().error().is_none());
    }

    #[tokio::test]
    async fn test_credential_flag_follows_set_and_clear() {
        // `false` arrives as an omitted result.
        let h = Harness::start(Config::default(), |_| Reply::Ok(Value::Null));
        assert!(!h.engine.refresh_credential_status().await.unwrap());

        assert!(h.engine.set_credential(MASKED_TOKEN).await.is_err());
        assert!(h.engine.set_credential("  ").await.is_err());
        assert!(!h.engine.status().credential_present());

        h.engine.set_credential("secret_abc").await.unwrap();
        assert!(h.engine.status().credential_present());

        h.engine.clear_credential().await.unwrap();
        assert!(!h.engine.status().credential_present());
        assert_eq!(h.host.count(Action::SetToken), 1);
    }

    #[tokio::test]
    async fn test_save_config_rejects_duplicate_keys_locally() {
        let h = Harness::start(Config::default(), |_| Reply::Ok(Value::Null));
        let cfg = Config {
            databases: vec![
                SourceConfig::new("db-1", "a", SourceKind::Task),
                SourceConfig::new("db-1", "b", SourceKind::Task),
            ],
            ..Config::default()
        };
        assert!(matches!(
            h.engine.save_config(cfg).await,
            Err(NudgeError::DuplicateKey(_))
        ));
        assert!(h.host.requests().is_empty());
    }

    #[tokio::test]
    async fn test_load_config_replaces_registry() {
        let h = Harness::start(Config::default(), |_| {
            Reply::Ok(json!({
                "databases": [{ "key": "db-7", "kind": "habit", "enabled": true }],
                "poll_interval_seconds": 0
            }))
        });
        let cfg = h.engine.load_config().await.unwrap();
        assert_eq!(cfg.databases[0].key.as_str(), "db-7");
        assert_eq!(cfg.poll_interval_seconds, 60);
        assert_eq!(h.engine.registry().enabled_sources().len(), 1);
    }
}
