//! Message shapes exchanged with the host collaborator.
//!
//! Outbound: `{ id, action, payload }`. Inbound: an event envelope
//! `{ event, data }` carrying either a correlated response on
//! [`RESPONSE_EVENT`] or one of the unsolicited notifications.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NudgeError, Result};
use crate::models::{SourceKey, StatusAction};

/// Event name carrying correlated responses.
pub const RESPONSE_EVENT: &str = "rpc:response";

/// Message used when a failed response carries no error text.
const UNKNOWN_REMOTE_ERROR: &str = "unknown error";

// ── CorrelationId ─────────────────────────────────────────────────────────────

/// Token pairing one outbound request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        CorrelationId(value)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        CorrelationId(value.to_string())
    }
}

// ── Action catalog ────────────────────────────────────────────────────────────

/// Every request the collaborator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    GetConfig,
    SaveConfig,
    GetTokenStatus,
    SetToken,
    ClearToken,
    GetTasks,
    GetHabits,
    UpdateStatus,
    UpdateHabitCheck,
    #[serde(rename = "resolveDataSourceID")]
    ResolveDataSourceId,
    ResolveTitlePropertyName,
    #[serde(rename = "openURL")]
    OpenUrl,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::GetConfig => "getConfig",
            Action::SaveConfig => "saveConfig",
            Action::GetTokenStatus => "getTokenStatus",
            Action::SetToken => "setToken",
            Action::ClearToken => "clearToken",
            Action::GetTasks => "getTasks",
            Action::GetHabits => "getHabits",
            Action::UpdateStatus => "updateStatus",
            Action::UpdateHabitCheck => "updateHabitCheck",
            Action::ResolveDataSourceId => "resolveDataSourceID",
            Action::ResolveTitlePropertyName => "resolveTitlePropertyName",
            Action::OpenUrl => "openURL",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Envelopes ─────────────────────────────────────────────────────────────────

/// A request sent to the collaborator exactly once per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundRequest {
    pub id: CorrelationId,
    pub action: Action,
    pub payload: Value,
}

/// The collaborator's answer to one [`OutboundRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundResponse {
    pub id: CorrelationId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InboundResponse {
    pub fn success(id: impl Into<CorrelationId>, data: Value) -> Self {
        Self {
            id: id.into(),
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: impl Into<CorrelationId>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Turn the success flag into a `Result`.
    ///
    /// An omitted `data` field becomes `Value::Null`; the collaborator drops
    /// empty values (`false`, `""`) from successful responses.
    pub fn into_result(self) -> Result<Value> {
        if self.ok {
            return Ok(self.data.unwrap_or(Value::Null));
        }
        let message = self
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_REMOTE_ERROR.to_string());
        Err(NudgeError::Remote(message))
    }
}

/// Anything the collaborator pushes over the shared inbound channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum HostEvent {
    #[serde(rename = "rpc:response")]
    Response(InboundResponse),
    /// Navigate to the given view key.
    #[serde(rename = "view-change")]
    ViewChange(String),
    /// Re-read the active view now.
    #[serde(rename = "refresh")]
    Refresh,
}

/// Unsolicited notifications, separated from responses by the host link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ViewChange(String),
    Refresh,
}

impl HostEvent {
    /// Split notifications from correlated responses; a response comes back
    /// unchanged in the `Err` arm so it can be routed.
    pub fn into_notification(self) -> std::result::Result<Notification, InboundResponse> {
        match self {
            HostEvent::Response(response) => Err(response),
            HostEvent::ViewChange(target) => Ok(Notification::ViewChange(target)),
            HostEvent::Refresh => Ok(Notification::Refresh),
        }
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Payload of `getTasks` / `getHabits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePayload {
    pub database_key: SourceKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusPayload {
    pub database_key: SourceKey,
    pub task_id: String,
    pub action: StatusAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHabitPayload {
    pub database_key: SourceKey,
    pub task_id: String,
    pub checked: bool,
}

/// Payload of both metadata lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvePayload {
    pub database_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenUrlPayload {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}
