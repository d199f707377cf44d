//! Aggregate tracker: the status message lists every currently-active tool
//! line. Finalization depends on the configured mode (delete, rewrite to the
//! done marker, or nothing at all).

use super::AggregateMode;
use super::queue::{
    DONE_MARKER, MessageTarget, SyncOp, TrackerState, spawn_sync_worker,
};
use crate::gateway::MessageGateway;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

pub struct AggregateTracker {
    mode: AggregateMode,
    gateway: Arc<dyn MessageGateway>,
    state: Arc<Mutex<TrackerState>>,
    queue: mpsc::UnboundedSender<SyncOp>,
}

impl AggregateTracker {
    pub fn new(
        gateway: Arc<dyn MessageGateway>,
        channel_id: String,
        root_id: Option<String>,
        mode: AggregateMode,
    ) -> Self {
        let state = Arc::new(Mutex::new(TrackerState::default()));
        let queue = spawn_sync_worker(
            gateway.clone(),
            MessageTarget { channel_id, root_id },
            state.clone(),
            render,
        );
        AggregateTracker {
            mode,
            gateway,
            state,
            queue,
        }
    }

    fn schedule_sync(&self, completed: bool) {
        // Off must never create a message, even when the tracker is
        // constructed directly instead of through the factory.
        if completed || self.mode == AggregateMode::Off {
            return;
        }
        // Send fails only if the worker is gone; nothing to sync then.
        let _ = self.queue.send(SyncOp::Sync);
    }
}

/// All active lines joined by newline, or the done marker when idle.
fn render(state: &TrackerState) -> String {
    if state.active.is_empty() {
        return DONE_MARKER.to_string();
    }
    state
        .active
        .iter()
        .map(|(_, line)| line.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl super::StatusTracker for AggregateTracker {
    fn on_activity(&self, tool_call_id: &str, summary: &str) {
        let completed = {
            let mut st = self.state.lock();
            st.upsert_active(tool_call_id, summary);
            st.completed
        };
        self.schedule_sync(completed);
    }

    fn on_end(&self, tool_call_id: &str) {
        let completed = {
            let mut st = self.state.lock();
            st.remove_active(tool_call_id);
            st.completed
        };
        self.schedule_sync(completed);
    }

    async fn on_complete(&self) {
        {
            self.state.lock().completed = true;
        }

        // Wait for every already-enqueued sync to settle so the terminal
        // action cannot race a create/update.
        let (done_tx, done_rx) = oneshot::channel();
        if self.queue.send(SyncOp::Drain(done_tx)).is_ok() {
            let _ = done_rx.await;
        }

        // Clear the handle unconditionally; a second on_complete is a no-op.
        let message_id = self.state.lock().message_id.take();
        let Some(id) = message_id else {
            return;
        };

        match self.mode {
            AggregateMode::Transient => {
                if let Err(e) = self.gateway.delete_message(&id).await {
                    log::debug!("status message delete failed: {}", e);
                }
            }
            AggregateMode::Persist => {
                if let Err(e) = self.gateway.update_message(&id, DONE_MARKER).await {
                    log::debug!("status message finalize failed: {}", e);
                }
            }
            AggregateMode::Off => {}
        }
    }
}
