//! Live per-source view state, keyed by [`SourceKey`].
//!
//! One surface exists per enabled source. Items on a surface are always the
//! full result of the latest read; results for a key whose surface has been
//! torn down are discarded.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use nudge_core::models::{Item, SourceConfig, SourceKey, SourceKind, StatusAction, View};

use crate::projection::{ControlState, Tab};

/// Label of the always-present settings tab.
pub const SETTINGS_TAB_LABEL: &str = "設定";

/// Presentation state for one enabled source.
#[derive(Debug, Clone)]
pub struct Surface {
    pub source: SourceConfig,
    pub items: Vec<Item>,
    pub updated_at: Option<DateTime<Local>>,
    in_flight: HashSet<String>,
}

impl Surface {
    fn new(source: SourceConfig) -> Self {
        Self {
            source,
            items: Vec::new(),
            updated_at: None,
            in_flight: HashSet::new(),
        }
    }

    pub fn key(&self) -> &SourceKey {
        &self.source.key
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// `true` when the last read returned nothing (or none has completed).
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the status button for `action` should be shown.
    pub fn offers(&self, action: StatusAction) -> bool {
        self.source.task().is_some_and(|task| task.can(action))
    }

    pub fn control_state(&self, item_id: &str) -> ControlState {
        if self.in_flight.contains(item_id) {
            return ControlState::Pending;
        }
        match self.items.iter().find(|item| item.id == item_id) {
            Some(item) if item.checked => ControlState::Checked,
            _ => ControlState::Enabled,
        }
    }

    fn tab(&self) -> Tab {
        Tab {
            view: View::Source(self.source.key.clone()),
            label: self.source.display_name().to_string(),
            kind: Some(self.kind()),
        }
    }
}

/// Shared, ordered table of surfaces.
#[derive(Debug, Clone, Default)]
pub struct SurfaceTable {
    inner: Arc<Mutex<Vec<Surface>>>,
}

impl SurfaceTable {
    fn lock(&self) -> MutexGuard<'_, Vec<Surface>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reconcile with the enabled sources.
    ///
    /// Surfaces are matched by key only: a retained key keeps its items and
    /// takes the new source fields, a vanished key is dropped with its items,
    /// and new keys start empty. Returns the resulting tab strip.
    pub fn rebuild(&self, sources: &[SourceConfig]) -> Vec<Tab> {
        let mut surfaces = self.lock();
        let mut previous: Vec<Surface> = std::mem::take(&mut *surfaces);
        for source in sources {
            let surface = match previous.iter().position(|s| s.source.key == source.key) {
                Some(idx) => {
                    let mut kept = previous.swap_remove(idx);
                    if kept.kind() != source.kind() {
                        kept.items.clear();
                        kept.updated_at = None;
                    }
                    kept.source = source.clone();
                    kept
                }
                None => Surface::new(source.clone()),
            };
            surfaces.push(surface);
        }
        for dropped in &previous {
            tracing::debug!(key = %dropped.key(), "surface torn down");
        }
        tabs_of(&surfaces)
    }

    pub fn tabs(&self) -> Vec<Tab> {
        tabs_of(&self.lock())
    }

    pub fn contains(&self, key: &SourceKey) -> bool {
        self.lock().iter().any(|s| s.key() == key)
    }

    pub fn get(&self, key: &SourceKey) -> Option<Surface> {
        self.lock().iter().find(|s| s.key() == key).cloned()
    }

    pub fn keys(&self) -> Vec<SourceKey> {
        self.lock().iter().map(|s| s.key().clone()).collect()
    }

    /// Replace the items of `key`'s surface. `None` when the surface no
    /// longer exists and the result was discarded.
    pub fn apply_items(&self, key: &SourceKey, items: Vec<Item>) -> Option<DateTime<Local>> {
        let mut surfaces = self.lock();
        let surface = surfaces.iter_mut().find(|s| s.key() == key)?;
        let now = Local::now();
        surface.items = items;
        surface.updated_at = Some(now);
        Some(now)
    }

    /// Mark `item_id` as submitted. `false` when it already is.
    pub fn begin_submit(&self, key: &SourceKey, item_id: &str) -> bool {
        let mut surfaces = self.lock();
        match surfaces.iter_mut().find(|s| s.key() == key) {
            Some(surface) => surface.in_flight.insert(item_id.to_string()),
            None => true,
        }
    }

    pub fn end_submit(&self, key: &SourceKey, item_id: &str) {
        if let Some(surface) = self.lock().iter_mut().find(|s| s.key() == key) {
            surface.in_flight.remove(item_id);
        }
    }

    /// Record a completed habit on the current item set.
    pub fn mark_checked(&self, key: &SourceKey, item_id: &str) {
        if let Some(surface) = self.lock().iter_mut().find(|s| s.key() == key) {
            if let Some(item) = surface.items.iter_mut().find(|i| i.id == item_id) {
                item.checked = true;
            }
        }
    }
}

fn tabs_of(surfaces: &[Surface]) -> Vec<Tab> {
    surfaces
        .iter()
        .map(Surface::tab)
        .chain(std::iter::once(Tab {
            view: View::Settings,
            label: SETTINGS_TAB_LABEL.to_string(),
            kind: None,
        }))
        .collect()
}
