//! Transient user notices
//!
//! All errors surface as a single auto-dismissing notice rather than
//! blocking the terminal. Only one notice is shown at a time; a newer one
//! replaces the current notice and restarts the dismissal timer. The timer
//! uses a generation counter so a superseded dismissal task cannot clear a
//! newer notice.

use std::sync::{Arc, Mutex};
use std::time::Duration;

const DISPLAY_DURATION: Duration = Duration::from_millis(3500);

#[derive(Default)]
struct NoticeState {
    generation: u64,
    message: Option<String>,
}

#[derive(Clone, Default)]
pub struct NoticeCenter {
    state: Arc<Mutex<NoticeState>>,
}

impl NoticeCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message`, replacing any current notice and restarting the
    /// dismissal timer.
    pub fn publish(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(notice = %message, "publishing notice");
        let generation = {
            let mut state = self.state.lock().expect("notice state poisoned");
            state.generation += 1;
            state.message = Some(message);
            state.generation
        };

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(DISPLAY_DURATION).await;
            let mut state = state.lock().expect("notice state poisoned");
            if state.generation == generation {
                state.message = None;
            }
        });
    }

    /// Dismiss the current notice immediately.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("notice state poisoned");
        state.generation += 1;
        state.message = None;
    }

    pub fn current(&self) -> Option<String> {
        self.state.lock().expect("notice state poisoned").message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_auto_dismisses() {
        let notices = NoticeCenter::new();
        notices.publish("backend unreachable");
        assert_eq!(notices.current().as_deref(), Some("backend unreachable"));

        tokio::time::sleep(DISPLAY_DURATION + Duration::from_millis(10)).await;
        assert_eq!(notices.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_notice_replaces_and_resets_timer() {
        let notices = NoticeCenter::new();
        notices.publish("first");

        tokio::time::sleep(DISPLAY_DURATION / 2).await;
        notices.publish("second");

        // The first notice's timer elapses without clearing the newer one.
        tokio::time::sleep(DISPLAY_DURATION / 2 + Duration::from_millis(10)).await;
        assert_eq!(notices.current().as_deref(), Some("second"));

        tokio::time::sleep(DISPLAY_DURATION).await;
        assert_eq!(notices.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_survives_stale_timer() {
        let notices = NoticeCenter::new();
        notices.publish("first");
        notices.clear();
        assert_eq!(notices.current(), None);

        notices.publish("second");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(notices.current().as_deref(), Some("second"));
    }
}
