//! What the presentation layer is told: render hints, the single-slot error
//! and the credential flag.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use nudge_core::error::{ErrorCategory, NudgeError};
use nudge_core::models::{Item, SourceKey, SourceKind, View};
use tokio::sync::mpsc;

// ── Render hints ──────────────────────────────────────────────────────────────

/// State of a habit item's completion control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Unchecked and clickable.
    Enabled,
    /// Checked and disabled while the completion call is in flight.
    Pending,
    /// Completion accepted; never unchecked from this side.
    Checked,
}

/// One entry in the tab strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub view: View,
    pub label: String,
    /// `None` for the settings tab.
    pub kind: Option<SourceKind>,
}

/// Instructions for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderHint {
    /// The tab set changed; settings is always last.
    Tabs(Vec<Tab>),
    ActiveView(View),
    /// A read completed for `key`; `items` replaces whatever was shown.
    Items {
        key: SourceKey,
        kind: SourceKind,
        items: Vec<Item>,
        updated_at: DateTime<Local>,
    },
    HabitControl {
        key: SourceKey,
        item_id: String,
        state: ControlState,
    },
    /// Current content of the error slot.
    Error(Option<String>),
    Credential(bool),
}

/// Sending half of the render-hint channel.
///
/// A dropped receiver only means nobody is rendering; hints are then dropped.
#[derive(Debug, Clone)]
pub struct HintSink {
    tx: mpsc::UnboundedSender<RenderHint>,
}

impl HintSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RenderHint>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, hint: RenderHint) {
        if self.tx.send(hint).is_err() {
            tracing::trace!("render hint dropped; no receiver");
        }
    }
}

// ── Status projection ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StatusSlots {
    error: Option<String>,
    credential_present: bool,
}

/// Single-slot error plus the credential flag.
///
/// The error slot keeps only the latest failure. It is cleared when a new
/// call starts and overwritten when one fails.
#[derive(Debug, Clone)]
pub struct StatusProjection {
    slots: Arc<Mutex<StatusSlots>>,
    hints: HintSink,
}

impl StatusProjection {
    pub fn new(hints: HintSink) -> Self {
        Self {
            slots: Arc::new(Mutex::new(StatusSlots::default())),
            hints,
        }
    }

    fn slots(&self) -> MutexGuard<'_, StatusSlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn error(&self) -> Option<String> {
        self.slots().error.clone()
    }

    pub fn clear_error(&self) {
        let had_error = self.slots().error.take().is_some();
        if had_error {
            self.hints.emit(RenderHint::Error(None));
        }
    }

    /// Overwrite the slot with `err`'s message.
    pub fn set_error(&self, err: &NudgeError) {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => tracing::debug!(error = %message, "rejected locally"),
            category => tracing::warn!(?category, error = %message, "call failed"),
        }
        self.slots().error = Some(message.clone());
        self.hints.emit(RenderHint::Error(Some(message)));
    }

    pub fn credential_present(&self) -> bool {
        self.slots().credential_present
    }

    pub fn set_credential(&self, present: bool) {
        self.slots().credential_present = present;
        self.hints.emit(RenderHint::Credential(present));
    }
}
