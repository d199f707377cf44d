//! Remote message gateway: the thin surface the tracker uses to talk to a
//! chat service. Create/update/delete are independently fallible; the
//! tracker treats every failure as best-effort and never retries beyond the
//! next natural sync.

mod rest;

pub use rest::RestMessageGateway;

use async_trait::async_trait;

/// Reference to a message the gateway created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub id: String,
}

/// Chat-service operations the tracker needs.
///
/// Errors are plain strings describing what went wrong (transport failure,
/// missing message, auth). Callers inspecting the result cannot distinguish
/// a transient network error from a message that was deleted externally.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Post a new message to `channel_id`, optionally threaded under
    /// `root_id`. Returns a handle for later updates/deletes.
    async fn create_message(
        &self,
        channel_id: &str,
        text: &str,
        root_id: Option<&str>,
    ) -> Result<MessageHandle, String>;

    /// Replace the body of an existing message.
    async fn update_message(&self, message_id: &str, text: &str) -> Result<(), String>;

    /// Remove a message.
    async fn delete_message(&self, message_id: &str) -> Result<(), String>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub struct MockPost {
        pub id: String,
        pub message: String,
        pub deleted: bool,
    }

    /// In-memory gateway that records every call, simulates latency so
    /// overlapping calls would be observable, and can be told to fail.
    pub struct MockGateway {
        pub posts: Mutex<Vec<MockPost>>,
        next_id: AtomicUsize,
        in_flight: AtomicBool,
        /// Set to true if a second gateway call ever started before the
        /// previous one settled.
        pub overlap_detected: AtomicBool,
        pub fail_creates: AtomicBool,
        pub fail_updates: AtomicBool,
        /// Extra latency per call, in milliseconds.
        pub latency_ms: AtomicUsize,
    }

    impl MockGateway {
        pub fn new() -> Self {
            MockGateway {
                posts: Mutex::new(Vec::new()),
                next_id: AtomicUsize::new(1),
                in_flight: AtomicBool::new(false),
                overlap_detected: AtomicBool::new(false),
                fail_creates: AtomicBool::new(false),
                fail_updates: AtomicBool::new(false),
                latency_ms: AtomicUsize::new(1),
            }
        }

        async fn enter(&self) {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlap_detected.store(true, Ordering::SeqCst);
            }
            let ms = self.latency_ms.load(Ordering::SeqCst) as u64;
            if ms > 0 {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }

        fn exit(&self) {
            self.in_flight.store(false, Ordering::SeqCst);
        }

        pub fn created_count(&self) -> usize {
            self.posts.lock().len()
        }

        pub fn live_posts(&self) -> Vec<MockPost> {
            self.posts.lock().iter().filter(|p| !p.deleted).cloned().collect()
        }
    }

    #[async_trait]
    impl MessageGateway for MockGateway {
        async fn create_message(
            &self,
            _channel_id: &str,
            text: &str,
            _root_id: Option<&str>,
        ) -> Result<MessageHandle, String> {
            self.enter().await;
            let result = if self.fail_creates.load(Ordering::SeqCst) {
                Err("simulated create failure".to_string())
            } else {
                let id = format!("post-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                self.posts.lock().push(MockPost {
                    id: id.clone(),
                    message: text.to_string(),
                    deleted: false,
                });
                Ok(MessageHandle { id })
            };
            self.exit();
            result
        }

        async fn update_message(&self, message_id: &str, text: &str) -> Result<(), String> {
            self.enter().await;
            let result = if self.fail_updates.load(Ordering::SeqCst) {
                Err("simulated update failure".to_string())
            } else {
                let mut posts = self.posts.lock();
                match posts.iter_mut().find(|p| p.id == message_id && !p.deleted) {
                    Some(post) => {
                        post.message = text.to_string();
                        Ok(())
                    }
                    None => Err(format!("message '{}' not found", message_id)),
                }
            };
            self.exit();
            result
        }

        async fn delete_message(&self, message_id: &str) -> Result<(), String> {
            self.enter().await;
            let result = {
                let mut posts = self.posts.lock();
                match posts.iter_mut().find(|p| p.id == message_id && !p.deleted) {
                    Some(post) => {
                        post.deleted = true;
                        Ok(())
                    }
                    None => Err(format!("message '{}' not found", message_id)),
                }
            };
            self.exit();
            result
        }
    }
}
