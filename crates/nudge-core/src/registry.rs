//! Entity registry: owner of the current [`Config`] and of the rules that
//! derive the live view set from it.
//!
//! The config is held behind an `Arc` that is swapped as a whole on save, so a
//! reader either sees the old source list or the new one, never a mix.
//! [`ConfigDraft`] models an editing session: sources without a key get one
//! the first time they are collected, and keep it for the rest of the session.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{
    Config, HabitProfile, SourceConfig, SourceKey, SourceKind, SourceProfile, StatusPropertyType,
    TaskProfile, View, DEFAULT_HABIT_DAYS, DEFAULT_HABIT_TITLE_PROPERTY,
};

// ── Derivation rules ──────────────────────────────────────────────────────────

/// Enabled sources in their configured order.
pub fn derive_enabled_sources(config: &Config) -> Vec<&SourceConfig> {
    config.databases.iter().filter(|db| db.enabled).collect()
}

/// Default view: first enabled task source, else first enabled source of any
/// kind, else settings.
pub fn pick_default_source(config: &Config) -> View {
    let enabled = derive_enabled_sources(config);
    enabled
        .iter()
        .find(|db| db.kind() == SourceKind::Task)
        .or_else(|| enabled.first())
        .map(|db| View::Source(db.key.clone()))
        .unwrap_or(View::Settings)
}

/// Resolve a navigation target, falling back to settings when it does not
/// name an enabled source.
pub fn resolve_view(config: &Config, target: &str) -> View {
    match View::parse(target) {
        View::Settings => View::Settings,
        View::Source(key) => {
            let known = config
                .databases
                .iter()
                .any(|db| db.enabled && db.key == key);
            if known {
                View::Source(key)
            } else {
                View::Settings
            }
        }
    }
}

// ── EntityRegistry ────────────────────────────────────────────────────────────

/// Process-wide holder of the active configuration.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    current: RwLock<Arc<Config>>,
}

impl EntityRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            current: RwLock::new(Arc::new(config.normalize())),
        }
    }

    /// The config as of now. Later saves do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Config> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a whole new config and return it.
    pub fn replace(&self, config: Config) -> Arc<Config> {
        let next = Arc::new(config.normalize());
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        tracing::debug!(
            sources = next.databases.len(),
            poll_interval_seconds = next.poll_interval_seconds,
            "config replaced"
        );
        next
    }

    pub fn source(&self, key: &SourceKey) -> Option<SourceConfig> {
        self.snapshot().source(key).cloned()
    }

    pub fn enabled_sources(&self) -> Vec<SourceConfig> {
        derive_enabled_sources(&self.snapshot())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn default_view(&self) -> View {
        pick_default_source(&self.snapshot())
    }

    pub fn resolve_view(&self, target: &str) -> View {
        resolve_view(&self.snapshot(), target)
    }
}

// ── Editing session ───────────────────────────────────────────────────────────

/// Editable, flat form of one source as the settings surface presents it.
///
/// Every field is kept regardless of `kind`, so toggling the kind back and
/// forth while editing does not lose input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceDraft {
    pub key: Option<SourceKey>,
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

impl SourceDraft {
    /// A new habit source as the "add" button creates it.
    pub fn new_habit() -> Self {
        Self {
            key: Some(SourceKey::generate()),
            name: SourceKind::Habit.default_name().to_string(),
            kind: SourceKind::Habit,
            enabled: true,
            title_property_name: DEFAULT_HABIT_TITLE_PROPERTY.to_string(),
            checkbox_property_name: DEFAULT_HABIT_DAYS.to_string(),
            ..Self::default()
        }
    }

    /// Change the kind, filling blank fields with the new kind's defaults.
    pub fn set_kind(&mut self, kind: SourceKind) {
        self.kind = kind;
        if self.name.trim().is_empty() {
            self.name = kind.default_name().to_string();
        }
        if kind == SourceKind::Habit {
            if self.title_property_name.trim().is_empty() {
                self.title_property_name = DEFAULT_HABIT_TITLE_PROPERTY.to_string();
            }
            if self.checkbox_property_name.trim().is_empty() {
                self.checkbox_property_name = DEFAULT_HABIT_DAYS.to_string();
            }
        }
    }

    /// The key this draft will be saved under, minting one on first use.
    pub fn ensure_key(&mut self) -> &SourceKey {
        if self.key.as_ref().is_some_and(SourceKey::is_empty) {
            self.key = None;
        }
        self.key.get_or_insert_with(SourceKey::generate)
    }

    /// Build the typed source. Text fields are trimmed; blanks get defaults.
    pub fn collect(&mut self) -> SourceConfig {
        let key = self.ensure_key().clone();
        let kind = self.kind;
        let name = match self.name.trim() {
            "" => kind.default_name().to_string(),
            name => name.to_string(),
        };
        let profile = match kind {
            SourceKind::Task => SourceProfile::Task(TaskProfile {
                status_property_name: self.status_property_name.trim().to_string(),
                status_property_type: self.status_property_type,
                status_in_progress: self.status_in_progress.trim().to_string(),
                status_done: self.status_done.trim().to_string(),
                status_paused: self.status_paused.trim().to_string(),
            }),
            SourceKind::Habit => SourceProfile::Habit(HabitProfile {
                checkbox_property_name: match self.checkbox_property_name.trim() {
                    "" => DEFAULT_HABIT_DAYS.to_string(),
                    days => days.to_string(),
                },
            }),
        };
        SourceConfig {
            key,
            name,
            enabled: self.enabled,
            database_id: self.database_id.trim().to_string(),
            data_source_id: self.data_source_id.trim().to_string(),
            title_property_name: self.title_property_name.trim().to_string(),
            profile,
        }
    }
}

impl From<&SourceConfig> for SourceDraft {
    fn from(source: &SourceConfig) -> Self {
        let mut draft = SourceDraft {
            key: (!source.key.is_empty()).then(|| source.key.clone()),
            name: source.name.clone(),
            kind: source.kind(),
            enabled: source.enabled,
            database_id: source.database_id.clone(),
            data_source_id: source.data_source_id.clone(),
            title_property_name: source.title_property_name.clone(),
            checkbox_property_name: DEFAULT_HABIT_DAYS.to_string(),
            ..SourceDraft::default()
        };
        match &source.profile {
            SourceProfile::Task(task) => {
                draft.status_property_name = task.status_property_name.clone();
                draft.status_property_type = task.status_property_type;
                draft.status_in_progress = task.status_in_progress.clone();
                draft.status_done = task.status_done.clone();
                draft.status_paused = task.status_paused.clone();
            }
            SourceProfile::Habit(habit) => {
                if !habit.checkbox_property_name.trim().is_empty() {
                    draft.checkbox_property_name = habit.checkbox_property_name.clone();
                }
            }
        }
        draft
    }
}

/// An in-progress edit of the whole configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigDraft {
    pub sources: Vec<SourceDraft>,
    pub launch_at_login: bool,
    pub notion_version: String,
}

impl ConfigDraft {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sources: config.databases.iter().map(SourceDraft::from).collect(),
            launch_at_login: config.launch_at_login,
            notion_version: config.notion_version.clone(),
        }
    }

    /// Append a new habit source and return it for further editing.
    pub fn add_source(&mut self) -> &mut SourceDraft {
        self.sources.push(SourceDraft::new_habit());
        let last = self.sources.len() - 1;
        &mut self.sources[last]
    }

    /// Remove the draft at `index`; out-of-range indices are ignored.
    pub fn remove_source(&mut self, index: usize) -> Option<SourceDraft> {
        (index < self.sources.len()).then(|| self.sources.remove(index))
    }

    /// Collect every draft, assigning keys in place to those lacking one.
    pub fn collect(&mut self) -> Vec<SourceConfig> {
        self.sources.iter_mut().map(SourceDraft::collect).collect()
    }

    /// Merge the collected edits over `base`, keeping fields this session
    /// does not edit (poll interval, pass-through extras).
    pub fn to_config(&mut self, base: &Config) -> Config {
        Config {
            databases: self.collect(),
            launch_at_login: self.launch_at_login,
            notion_version: self.notion_version.trim().to_string(),
            ..base.clone()
        }
    }
}
