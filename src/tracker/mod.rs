//! Status trackers: convert a stream of tool lifecycle events into a single,
//! continuously-edited status message, and finalize it when the reply
//! completes.
//!
//! Two variants share one shape: [`aggregate`] shows every active tool line
//! at once, [`edit_in_place`] progressively edits one message (latest line
//! only, or an accumulating struck-through log). Both are best-effort: chat
//! delivery problems never reach the code running the tools.

mod aggregate;
mod edit_in_place;
mod queue;

pub use aggregate::AggregateTracker;
pub use edit_in_place::EditInPlaceTracker;

use crate::display::{format_tool_summary, resolve_tool_display};
use crate::gateway::MessageGateway;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use strum::{AsRefStr, EnumString};

/// How the aggregate tracker finalizes its status message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggregateMode {
    /// Never create a status message at all.
    #[default]
    Off,
    /// Leave the message behind, rewritten to the done marker.
    Persist,
    /// Delete the message once the reply completes.
    Transient,
}

/// What the edit-in-place tracker shows while tools run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EditDisplay {
    /// Only the most recently started, still-active tool line.
    #[default]
    Single,
    /// Every line so far; finished ones struck through.
    List,
}

/// Edit-in-place settings. Deserializes from `{"display": "single" | "list"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditInPlaceConfig {
    #[serde(default)]
    pub display: EditDisplay,
}

/// Tracker selection: either a bare aggregate mode string (`"off"`,
/// `"persist"`, `"transient"`) or an edit-in-place settings object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityConfig {
    Aggregate(AggregateMode),
    EditInPlace(EditInPlaceConfig),
}

impl Default for ActivityConfig {
    fn default() -> Self {
        ActivityConfig::Aggregate(AggregateMode::Off)
    }
}

/// Lifecycle phase of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolPhase {
    Start,
    Update,
    End,
}

/// Fired when a tool starts, updates, or ends execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolActivityEvent {
    pub phase: ToolPhase,
    pub tool_name: String,
    pub tool_call_id: String,
    /// Precomputed display line; derived from `tool_name`/`args` when empty.
    #[serde(default)]
    pub summary: String,
    /// Tool arguments (only on start).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// One status message per tracker, fed by tool lifecycle events.
///
/// `on_activity` and `on_end` are fire-and-forget: they mutate local state
/// and schedule a remote sync, and never fail. `on_complete` must be awaited
/// exactly once before the tracker is discarded; it drains pending syncs and
/// performs the mode-specific terminal action.
#[async_trait]
pub trait StatusTracker: Send + Sync {
    /// A tool started or updated: record/overwrite its display line.
    fn on_activity(&self, tool_call_id: &str, summary: &str);

    /// A tool ended: drop it from the active set. Unknown ids are a no-op.
    fn on_end(&self, tool_call_id: &str);

    /// The reply is complete: drain pending syncs, then finalize the message.
    async fn on_complete(&self);

    /// Route a lifecycle event to `on_activity`/`on_end`, deriving the
    /// summary from the tool name and arguments when the event carries none.
    fn on_event(&self, event: &ToolActivityEvent) {
        match event.phase {
            ToolPhase::Start | ToolPhase::Update => {
                if event.summary.is_empty() {
                    let display =
                        resolve_tool_display(&event.tool_name, event.args.as_ref());
                    self.on_activity(&event.tool_call_id, &format_tool_summary(&display));
                } else {
                    self.on_activity(&event.tool_call_id, &event.summary);
                }
            }
            ToolPhase::End => self.on_end(&event.tool_call_id),
        }
    }
}

/// Tracker that never talks to the gateway; used for `AggregateMode::Off`.
struct NoopTracker;

#[async_trait]
impl StatusTracker for NoopTracker {
    fn on_activity(&self, _tool_call_id: &str, _summary: &str) {}

    fn on_end(&self, _tool_call_id: &str) {}

    async fn on_complete(&self) {}
}

/// Build a tracker for one reply. Must be called inside a tokio runtime
/// (trackers spawn a sync worker task).
pub fn create_status_tracker(
    gateway: Arc<dyn MessageGateway>,
    channel_id: impl Into<String>,
    root_id: Option<String>,
    config: ActivityConfig,
) -> Box<dyn StatusTracker> {
    match config {
        ActivityConfig::Aggregate(AggregateMode::Off) => Box::new(NoopTracker),
        ActivityConfig::Aggregate(mode) => {
            Box::new(AggregateTracker::new(gateway, channel_id.into(), root_id, mode))
        }
        ActivityConfig::EditInPlace(settings) => Box::new(EditInPlaceTracker::new(
            gateway,
            channel_id.into(),
            root_id,
            settings.display,
        )),
    }
}
