//! Edit-in-place tracker: one message, progressively edited. `Single`
//! display shows only the latest active tool line; `List` accumulates every
//! line and strikes through the finished ones. The message is always deleted
//! on completion — the final reply supersedes it.

use super::EditDisplay;
use super::queue::{
    DONE_MARKER, MessageTarget, SyncOp, TrackerState, spawn_sync_worker,
};
use crate::gateway::MessageGateway;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

pub struct EditInPlaceTracker {
    display: EditDisplay,
    gateway: Arc<dyn MessageGateway>,
    state: Arc<Mutex<TrackerState>>,
    queue: mpsc::UnboundedSender<SyncOp>,
}

impl EditInPlaceTracker {
    pub fn new(
        gateway: Arc<dyn MessageGateway>,
        channel_id: String,
        root_id: Option<String>,
        display: EditDisplay,
    ) -> Self {
        let state = Arc::new(Mutex::new(TrackerState::default()));
        let queue = spawn_sync_worker(
            gateway.clone(),
            MessageTarget { channel_id, root_id },
            state.clone(),
            move |st| render(display, st),
        );
        EditInPlaceTracker {
            display,
            gateway,
            state,
            queue,
        }
    }

    fn schedule_sync(&self, completed: bool) {
        if completed {
            return;
        }
        let _ = self.queue.send(SyncOp::Sync);
    }
}

fn render(display: EditDisplay, state: &TrackerState) -> String {
    match display {
        // Most recently first-added active line; updates to an id never move
        // it, so the shown line does not jump around on every update.
        EditDisplay::Single => match state.active.last() {
            Some((_, line)) => line.clone(),
            None => DONE_MARKER.to_string(),
        },
        EditDisplay::List => {
            let mut lines: Vec<String> = state
                .completed_lines
                .iter()
                .map(|line| format!("~~{}~~", line))
                .collect();
            lines.extend(state.active.iter().map(|(_, line)| line.clone()));
            if lines.is_empty() {
                DONE_MARKER.to_string()
            } else {
                lines.join("\n")
            }
        }
    }
}

#[async_trait]
impl super::StatusTracker for EditInPlaceTracker {
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
            let line = st.remove_active(tool_call_id);
            if self.display == EditDisplay::List {
                if let Some(line) = line {
                    st.completed_lines.push(line);
                }
            }
            st.completed
        };
        self.schedule_sync(completed);
    }

    async fn on_complete(&self) {
        {
            self.state.lock().completed = true;
        }

        let (done_tx, done_rx) = oneshot::channel();
        if self.queue.send(SyncOp::Drain(done_tx)).is_ok() {
            let _ = done_rx.await;
        }

        let message_id = self.state.lock().message_id.take();
        let Some(id) = message_id else {
            return;
        };

        // The final reply replaces the status message, whatever the display.
        if let Err(e) = self.gateway.delete_message(&id).await {
            log::debug!("status message delete failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use crate::tracker::StatusTracker;
    use std::time::Duration;

    fn tracker(gateway: &Arc<MockGateway>, display: EditDisplay) -> EditInPlaceTracker {
        EditInPlaceTracker::new(gateway.clone(), "ch-1".to_string(), None, display)
    }

    async fn tick() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_single_shows_latest_active_line() {
        let gateway = Arc::new(MockGateway::new());
        let t = tracker(&gateway, EditDisplay::Single);

        t.on_activity("tc-1", "🛠️ Exec: ls");
        tick().await;
        assert_eq!(gateway.posts.lock()[0].message, "🛠️ Exec: ls");

        t.on_activity("tc-2", "📖 Read: foo.rs");
        tick().await;
        assert_eq!(gateway.created_count(), 1);
        assert_eq!(gateway.posts.lock()[0].message, "📖 Read: foo.rs");

        t.on_complete().await;
    }

    #[tokio::test]
    async fn test_single_update_does_not_reorder() {
        let gateway = Arc::new(MockGateway::new());
        let t = tracker(&gateway, EditDisplay::Single);

        t.on_activity("tc-1", "🛠️ Exec: ls");
        t.on_activity("tc-2", "📖 Read: foo.rs");
        tick().await;

        // Updating tc-1 keeps its original position; tc-2 stays "most
        // recent" and remains the shown line.
        t.on_activity("tc-1", "🛠️ Exec: ls -la");
        tick().await;
        assert_eq!(gateway.posts.lock()[0].message, "📖 Read: foo.rs");

        // Once tc-2 ends, the updated tc-1 line shows.
        t.on_end("tc-2");
        tick().await;
        assert_eq!(gateway.posts.lock()[0].message, "🛠️ Exec: ls -la");

        t.on_complete().await;
    }

    #[tokio::test]
    async fn test_single_shows_done_marker_when_idle() {
        let gateway = Arc::new(MockGateway::new());
        let t = tracker(&gateway, EditDisplay::Single);

        t.on_activity("tc-1", "🛠️ Exec: ls");
        tick().await;
        t.on_end("tc-1");
        tick().await;

        assert_eq!(gateway.posts.lock()[0].message, "✅ Done");

        t.on_complete().await;
    }

    #[tokio::test]
    async fn test_list_strikes_completed_lines() {
        let gateway = Arc::new(MockGateway::new());
        let t = tracker(&gateway, EditDisplay::List);

        t.on_activity("tc-1", "🛠️ Exec: ls");
        t.on_activity("tc-2", "📖 Read: foo.rs");
        tick().await;
        assert_eq!(gateway.posts.lock()[0].message, "🛠️ Exec: ls\n📖 Read: foo.rs");

        t.on_end("tc-1");
        tick().await;
        assert_eq!(
            gateway.posts.lock()[0].message,
            "~~🛠️ Exec: ls~~\n📖 Read: foo.rs"
        );

        // Completed lines stay struck through in every later render.
        t.on_activity("tc-3", "✍️ Write: out.txt");
        tick().await;
        assert_eq!(
            gateway.posts.lock()[0].message,
            "~~🛠️ Exec: ls~~\n📖 Read: foo.rs\n✍️ Write: out.txt"
        );

        t.on_complete().await;
    }

    #[tokio::test]
    async fn test_list_keeps_completion_order() {
        let gateway = Arc::new(MockGateway::new());
        let t = tracker(&gateway, EditDisplay::List);

        t.on_activity("tc-1", "first");
        t.on_activity("tc-2", "second");
        tick().await;
        // tc-2 ends before tc-1: history is in completion order.
        t.on_end("tc-2");
        t.on_end("tc-1");
        tick().await;

        assert_eq!(gateway.posts.lock()[0].message, "~~second~~\n~~first~~");

        t.on_complete().await;
    }

    #[tokio::test]
    async fn test_deletes_on_complete_for_both_displays() {
        for display in [EditDisplay::Single, EditDisplay::List] {
            let gateway = Arc::new(MockGateway::new());
            let t = tracker(&gateway, display);

            t.on_activity("tc-1", "🛠️ Exec: ls");
            tick().await;
            t.on_end("tc-1");
            tick().await;
            t.on_complete().await;

            assert_eq!(gateway.created_count(), 1);
            assert!(gateway.posts.lock()[0].deleted, "display {:?}", display);
        }
    }

    #[tokio::test]
    async fn test_no_message_without_activity() {
        let gateway = Arc::new(MockGateway::new());
        let t = tracker(&gateway, EditDisplay::List);

        t.on_complete().await;
        assert_eq!(gateway.created_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_end_is_harmless() {
        let gateway = Arc::new(MockGateway::new());
        let t = tracker(&gateway, EditDisplay::List);

        t.on_activity("tc-1", "🛠️ Exec: ls");
        tick().await;
        t.on_end("tc-1");
        t.on_end("tc-1");
        t.on_end("never-started");
        tick().await;

        // One struck line, not three.
        assert_eq!(gateway.posts.lock()[0].message, "~~🛠️ Exec: ls~~");

        t.on_complete().await;
    }
}
