//! Serialized mutation queue shared by both tracker variants.
//!
//! A single worker task per tracker drains sync ops one at a time, so at most
//! one gateway call is ever in flight and ops settle in enqueue order. Each
//! sync op renders from the *latest* local state, so bursts of events coalesce
//! naturally while an earlier op is still in flight.

use crate::gateway::MessageGateway;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Fixed body used once no tool is active (and as the persist-mode epitaph).
pub(crate) const DONE_MARKER: &str = "✅ Done";

/// Where the status message lives.
#[derive(Debug, Clone)]
pub(crate) struct MessageTarget {
    pub channel_id: String,
    pub root_id: Option<String>,
}

/// Local state shared between event handlers and the sync worker.
///
/// The remote message id is only ever written inside queue ops; event
/// handlers touch the active set and the completion latch.
#[derive(Debug, Default)]
pub(crate) struct TrackerState {
    /// Insertion-ordered active set: tool_call_id → current display line.
    /// Overwrites keep the original position.
    pub active: Vec<(String, String)>,
    /// Completed display lines, in completion order (list display only).
    pub completed_lines: Vec<String>,
    /// Id of the one outstanding remote message, if any.
    pub message_id: Option<String>,
    /// One-way latch: once set, no new sync ops are enqueued.
    pub completed: bool,
}

impl TrackerState {
    pub fn upsert_active(&mut self, tool_call_id: &str, line: &str) {
        if let Some(entry) = self.active.iter_mut().find(|(id, _)| id == tool_call_id) {
            entry.1 = line.to_string();
        } else {
            self.active
                .push((tool_call_id.to_string(), line.to_string()));
        }
    }

    /// Remove an active entry, returning its last known line. Unknown ids
    /// return `None` (late or duplicate end events are harmless).
    pub fn remove_active(&mut self, tool_call_id: &str) -> Option<String> {
        let idx = self.active.iter().position(|(id, _)| id == tool_call_id)?;
        Some(self.active.remove(idx).1)
    }
}

pub(crate) enum SyncOp {
    /// Render the current state and push it to the gateway.
    Sync,
    /// Marker op for `on_complete`: answered once every earlier op settled.
    Drain(oneshot::Sender<()>),
}

/// Spawn the per-tracker sync worker and return its queue handle.
///
/// The worker lives until the last sender (held by the tracker) is dropped.
/// Gateway failures are logged and discarded; a failed op never stops the
/// queue. A failed update deliberately keeps the handle rather than
/// recreating the message, since a deleted-externally message is
/// indistinguishable from a transient failure and duplicates are worse than
/// a stale line.
pub(crate) fn spawn_sync_worker<R>(
    gateway: Arc<dyn MessageGateway>,
    target: MessageTarget,
    state: Arc<Mutex<TrackerState>>,
    render: R,
) -> mpsc::UnboundedSender<SyncOp>
where
    R: Fn(&TrackerState) -> String + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            match op {
                SyncOp::Drain(done) => {
                    let _ = done.send(());
                }
                SyncOp::Sync => {
                    let (body, existing) = {
                        let st = state.lock();
                        if st.completed {
                            continue;
                        }
                        (render(&st), st.message_id.clone())
                    };

                    match existing {
                        None => {
                            match gateway
                                .create_message(
                                    &target.channel_id,
                                    &body,
                                    target.root_id.as_deref(),
                                )
                                .await
                            {
                                Ok(handle) => {
                                    state.lock().message_id = Some(handle.id);
                                }
                                Err(e) => {
                                    log::debug!("status message create failed: {}", e);
                                }
                            }
                        }
                        Some(id) => {
                            if let Err(e) = gateway.update_message(&id, &body).await {
                                log::debug!("status message update failed: {}", e);
                            }
                        }
                    }
                }
            }
        }
    });

    tx
}
