//! Data model shared by the registry, the runtime and the wire protocol.
//!
//! `SourceConfig` is a tagged variant in memory but travels as the flat record
//! the collaborator stores; [`RawSourceConfig`] is the bridge between the two.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NudgeError, Result};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Identifier of the fixed settings view.
pub const SETTINGS_VIEW: &str = "settings";

/// Polling cadence used when the config carries no positive interval.
pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 60;

/// Longest polling cadence honoured; larger values are clamped to one day.
pub const MAX_POLL_INTERVAL_SECS: i64 = 86_400;

/// Default page size forwarded to the collaborator.
pub const DEFAULT_MAX_RESULTS: i64 = 30;

/// Day labels used for habit checkbox columns, Sunday first.
pub const DEFAULT_HABIT_DAYS: &str = "日,月,火,水,木,金,土";

/// Title property name pre-filled for new habit sources.
pub const DEFAULT_HABIT_TITLE_PROPERTY: &str = "名前";

/// Placeholder shown in place of a stored credential.
pub const MASKED_TOKEN: &str = "●●●●●●●●●●●●";

// ── SourceKey ─────────────────────────────────────────────────────────────────

/// Stable identity of a tracked source.
///
/// Generated once when the source is created and carried verbatim through
/// every later edit, save and reload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SourceKey(String);

impl SourceKey {
    /// Mint a fresh key of the form `db-xxxxxxxx`.
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        SourceKey(format!("db-{}", &uuid[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceKey {
    fn from(value: &str) -> Self {
        SourceKey(value.to_string())
    }
}

impl From<String> for SourceKey {
    fn from(value: String) -> Self {
        SourceKey(value)
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

/// How a source's items are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Status-driven items; reads return the in-progress set.
    #[default]
    Task,
    /// Daily completion items; reads return today's unchecked habits.
    Habit,
}

impl SourceKind {
    /// Label used when a source is saved with a blank name.
    pub fn default_name(self) -> &'static str {
        match self {
            SourceKind::Task => "タスク",
            SourceKind::Habit => "習慣",
        }
    }

    /// Placeholder for items whose title property is empty.
    pub fn untitled_label(self) -> &'static str {
        match self {
            SourceKind::Task => "(無題)",
            SourceKind::Habit => "(未設定)",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Task => f.write_str("task"),
            SourceKind::Habit => f.write_str("habit"),
        }
    }
}

/// External property type holding a task's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusPropertyType {
    #[default]
    Status,
    Select,
}

/// Status transition requested for a task item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    Done,
    Paused,
    /// Back to in-progress.
    Resume,
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusAction::Done => f.write_str("done"),
            StatusAction::Paused => f.write_str("paused"),
            StatusAction::Resume => f.write_str("resume"),
        }
    }
}

// ── Kind-specific profiles ────────────────────────────────────────────────────

/// Fields that only apply to task sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskProfile {
    pub status_property_name: String,
    pub status_property_type: StatusPropertyType,
    pub status_in_progress: String,
    pub status_done: String,
    pub status_paused: String,
}

impl TaskProfile {
    /// External status value targeted by `action`, or `None` when the source
    /// leaves it blank (the action is then not offered).
    pub fn status_for(&self, action: StatusAction) -> Option<&str> {
        let value = match action {
            StatusAction::Done => &self.status_done,
            StatusAction::Paused => &self.status_paused,
            StatusAction::Resume => &self.status_in_progress,
        };
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn can(&self, action: StatusAction) -> bool {
        self.status_for(action).is_some()
    }
}

/// Fields that only apply to habit sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitProfile {
    /// Comma-separated checkbox property names, one per weekday, Sunday first.
    pub checkbox_property_name: String,
}

impl Default for HabitProfile {
    fn default() -> Self {
        Self {
            checkbox_property_name: DEFAULT_HABIT_DAYS.to_string(),
        }
    }
}

impl HabitProfile {
    /// Non-empty, trimmed day labels.
    pub fn day_labels(&self) -> Vec<&str> {
        let raw = self.checkbox_property_name.trim();
        let raw = if raw.is_empty() { DEFAULT_HABIT_DAYS } else { raw };
        let labels: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if labels.is_empty() {
            vec![raw]
        } else {
            labels
        }
    }

    /// Checkbox property that represents `weekday`.
    ///
    /// A single label applies to every day; a list shorter than the week falls
    /// back to its first entry.
    pub fn checkbox_for(&self, weekday: Weekday) -> &str {
        let labels = self.day_labels();
        if labels.len() == 1 {
            return labels[0];
        }
        let idx = weekday.num_days_from_sunday() as usize;
        labels.get(idx).copied().unwrap_or(labels[0])
    }
}

/// Kind discriminator plus the kind's own payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceProfile {
    Task(TaskProfile),
    Habit(HabitProfile),
}

impl SourceProfile {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceProfile::Task(_) => SourceKind::Task,
            SourceProfile::Habit(_) => SourceKind::Habit,
        }
    }

    pub fn default_for(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Task => SourceProfile::Task(TaskProfile::default()),
            SourceKind::Habit => SourceProfile::Habit(HabitProfile::default()),
        }
    }
}

// ── SourceConfig ──────────────────────────────────────────────────────────────

/// One tracked source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSourceConfig", into = "RawSourceConfig")]
pub struct SourceConfig {
    pub key: SourceKey,
    pub name: String,
    pub enabled: bool,
    pub database_id: String,
    pub data_source_id: String,
    pub title_property_name: String,
    pub profile: SourceProfile,
}

impl SourceConfig {
    /// An enabled source of `kind` with default profile fields.
    pub fn new(key: impl Into<SourceKey>, name: impl Into<String>, kind: SourceKind) -> Self {
        let title_property_name = match kind {
            SourceKind::Task => String::new(),
            SourceKind::Habit => DEFAULT_HABIT_TITLE_PROPERTY.to_string(),
        };
        Self {
            key: key.into(),
            name: name.into(),
            enabled: true,
            database_id: String::new(),
            data_source_id: String::new(),
            title_property_name,
            profile: SourceProfile::default_for(kind),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.profile.kind()
    }

    /// Name shown on the tab; falls back to the kind label.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            self.kind().default_name()
        } else {
            name
        }
    }

    pub fn task(&self) -> Option<&TaskProfile> {
        match &self.profile {
            SourceProfile::Task(task) => Some(task),
            SourceProfile::Habit(_) => None,
        }
    }

    pub fn habit(&self) -> Option<&HabitProfile> {
        match &self.profile {
            SourceProfile::Habit(habit) => Some(habit),
            SourceProfile::Task(_) => None,
        }
    }
}

/// Flat wire shape of [`SourceConfig`].
///
/// Every field is optional on input; a missing `kind` means `task`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSourceConfig {
    pub key: SourceKey,
    pub name: String,
    pub kind: SourceKind,
    pub enabled: bool,
    pub database_id: String,
    pub data_source_id: String,
    pub title_property_name: String,
    pub status_property_name: String,
    pub status_property_type: StatusPropertyType,
    pub status_in_progress: String,
    pub status_done: String,
    pub status_paused: String,
    pub checkbox_property_name: String,
}

impl From<RawSourceConfig> for SourceConfig {
    fn from(raw: RawSourceConfig) -> Self {
        let profile = match raw.kind {
            SourceKind::Task => SourceProfile::Task(TaskProfile {
                status_property_name: raw.status_property_name,
                status_property_type: raw.status_property_type,
                status_in_progress: raw.status_in_progress,
                status_done: raw.status_done,
                status_paused: raw.status_paused,
            }),
            SourceKind::Habit => SourceProfile::Habit(HabitProfile {
                checkbox_property_name: raw.checkbox_property_name,
            }),
        };
        SourceConfig {
            key: raw.key,
            name: raw.name,
            enabled: raw.enabled,
            database_id: raw.database_id,
            data_source_id: raw.data_source_id,
            title_property_name: raw.title_property_name,
            profile,
        }
    }
}

impl From<SourceConfig> for RawSourceConfig {
    fn from(source: SourceConfig) -> Self {
        let mut raw = RawSourceConfig {
            key: source.key,
            name: source.name,
            kind: source.profile.kind(),
            enabled: source.enabled,
            database_id: source.database_id,
            data_source_id: source.data_source_id,
            title_property_name: source.title_property_name,
            ..RawSourceConfig::default()
        };
        match source.profile {
            SourceProfile::Task(task) => {
                raw.status_property_name = task.status_property_name;
                raw.status_property_type = task.status_property_type;
                raw.status_in_progress = task.status_in_progress;
                raw.status_done = task.status_done;
                raw.status_paused = task.status_paused;
            }
            SourceProfile::Habit(habit) => {
                raw.checkbox_property_name = habit.checkbox_property_name;
            }
        }
        raw
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// The user configuration: tracked sources plus global settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracked sources in display order.
    pub databases: Vec<SourceConfig>,
    pub launch_at_login: bool,
    /// Protocol version header, passed through untouched.
    pub notion_version: String,
    pub poll_interval_seconds: i64,
    pub max_results: i64,
    /// Fields this crate does not interpret; kept so a save never drops them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            databases: Vec::new(),
            launch_at_login: false,
            notion_version: String::new(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
            max_results: DEFAULT_MAX_RESULTS,
            extra: Map::new(),
        }
    }
}

impl Config {
    /// Polling period; non-positive values fall back to 60 seconds and
    /// anything above a day is clamped to a day.
    pub fn poll_interval(&self) -> Duration {
        let secs = if self.poll_interval_seconds > 0 {
            self.poll_interval_seconds.min(MAX_POLL_INTERVAL_SECS)
        } else {
            DEFAULT_POLL_INTERVAL_SECS
        };
        Duration::from_secs(secs as u64)
    }

    pub fn source(&self, key: &SourceKey) -> Option<&SourceConfig> {
        self.databases.iter().find(|db| &db.key == key)
    }

    /// Apply defaults to every blank field that has one.
    ///
    /// Keys that are already present are never touched.
    pub fn normalize(mut self) -> Self {
        if self.poll_interval_seconds <= 0 {
            self.poll_interval_seconds = DEFAULT_POLL_INTERVAL_SECS;
        }
        if self.max_results <= 0 {
            self.max_results = DEFAULT_MAX_RESULTS;
        }
        for db in &mut self.databases {
            if db.key.is_empty() {
                db.key = SourceKey::generate();
            }
            if db.name.trim().is_empty() {
                db.name = db.kind().default_name().to_string();
            }
            if let SourceProfile::Habit(habit) = &mut db.profile {
                if habit.checkbox_property_name.trim().is_empty() {
                    habit.checkbox_property_name = DEFAULT_HABIT_DAYS.to_string();
                }
            }
        }
        self
    }

    /// Reject configurations that would break key uniqueness.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for db in &self.databases {
            if db.key.is_empty() {
                return Err(NudgeError::InvalidConfig(format!(
                    "database '{}' has no key",
                    db.display_name()
                )));
            }
            if !seen.insert(&db.key) {
                return Err(NudgeError::DuplicateKey(db.key.clone()));
            }
        }
        Ok(())
    }
}

// ── Item ──────────────────────────────────────────────────────────────────────

/// One entry returned by a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub checked: bool,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: String::new(),
            last_edited_time: None,
            status: None,
            checked: false,
        }
    }

    pub fn display_title(&self, kind: SourceKind) -> &str {
        if self.title.trim().is_empty() {
            kind.untitled_label()
        } else {
            &self.title
        }
    }
}

// ── View ──────────────────────────────────────────────────────────────────────

/// A presentable view: the settings page or one enabled source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum View {
    Settings,
    Source(SourceKey),
}

impl View {
    /// Interpret a raw navigation target without checking it is enabled.
    pub fn parse(target: &str) -> Self {
        let target = target.trim();
        if target.is_empty() || target == SETTINGS_VIEW {
            View::Settings
        } else {
            View::Source(SourceKey::from(target))
        }
    }

    pub fn is_settings(&self) -> bool {
        matches!(self, View::Settings)
    }

    pub fn source_key(&self) -> Option<&SourceKey> {
        match self {
            View::Settings => None,
            View::Source(key) => Some(key),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Settings => f.write_str(SETTINGS_VIEW),
            View::Source(key) => write!(f, "{key}"),
        }
    }
}
