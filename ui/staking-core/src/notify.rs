//! Single-slot, transient user notifications. The newest message always
//! replaces the one on screen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Monotonic id; distinguishes two notifications with the same text.
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub visible: bool,
    pub shown_at: Instant,
}

#[derive(Clone)]
pub struct NotificationSink {
    slot: Arc<watch::Sender<Option<Notification>>>,
    next_id: Arc<AtomicU64>,
    ttl: Duration,
}

impl NotificationSink {
    pub fn new(ttl: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            next_id: Arc::new(AtomicU64::new(1)),
            ttl,
        }
    }

    /// Replace whatever is displayed with a new message. Returns its id.
    pub fn show(&self, severity: Severity, message: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = message.into();
        tracing::debug!(id, severity = severity.as_str(), %message, "notification");
        self.slot.send_replace(Some(Notification {
            id,
            severity,
            message,
            visible: true,
            shown_at: Instant::now(),
        }));
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(Severity::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.show(Severity::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(Severity::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show(Severity::Info, message)
    }

    pub fn dismiss(&self) {
        self.slot.send_if_modified(|slot| match slot {
            Some(n) if n.visible => {
                n.visible = false;
                true
            }
            _ => false,
        });
    }

    /// The notification currently on screen, if any.
    pub fn visible(&self) -> Option<Notification> {
        self.slot.borrow().as_ref().filter(|n| n.visible).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.slot.subscribe()
    }

    /// Total number of notifications shown so far.
    pub fn shown_count(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }

    /// When the visible notification is due to disappear.
    pub fn deadline(&self) -> Option<Instant> {
        self.slot
            .borrow()
            .as_ref()
            .filter(|n| n.visible)
            .map(|n| n.shown_at + self.ttl)
    }

    /// Hide the visible notification if its time is up. Returns true if it
    /// was hidden.
    pub fn expire(&self, now: Instant) -> bool {
        let ttl = self.ttl;
        self.slot.send_if_modified(|slot| match slot {
            Some(n) if n.visible && now >= n.shown_at + ttl => {
                n.visible = false;
                true
            }
            _ => false,
        })
    }

    /// Auto-dismiss driver. Never returns; stop it by dropping the future.
    pub async fn expire_loop(&self) {
        let mut rx = self.subscribe();
        loop {
            match self.deadline() {
                Some(deadline) => {
                    tokio::select! {
                        _ = time::sleep_until(deadline) => {
                            self.expire(Instant::now());
                        }
                        _ = rx.changed() => {}
                    }
                }
                None => {
                    // the sender lives in `self`, so this cannot fail
                    let _ = rx.changed().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(6);

    #[tokio::test(start_paused = true)]
    async fn newer_notification_replaces_the_visible_one() {
        let sink = NotificationSink::new(TTL);
        let a = sink.info("first");
        let b = sink.error("second");

        let visible = sink.visible().unwrap();
        assert_eq!(visible.id, b);
        assert_ne!(visible.id, a);
        assert_eq!(visible.message, "second");
        assert_eq!(visible.severity, Severity::Error);
        assert_eq!(sink.shown_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expires_only_after_ttl() {
        let sink = NotificationSink::new(TTL);
        sink.success("done");
        let shown_at = sink.visible().unwrap().shown_at;

        assert!(!sink.expire(shown_at + Duration::from_secs(5)));
        assert!(sink.visible().is_some());
        assert!(sink.expire(shown_at + TTL));
        assert!(sink.visible().is_none());
        assert_eq!(sink.deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_dismiss_hides_immediately() {
        let sink = NotificationSink::new(TTL);
        sink.warning("careful");
        sink.dismiss();
        assert!(sink.visible().is_none());
        // dismissing twice is harmless
        sink.dismiss();
        assert_eq!(sink.shown_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expire_loop_dismisses_and_restarts_for_new_messages() {
        let sink = NotificationSink::new(TTL);
        let driver = {
            let sink = sink.clone();
            tokio::spawn(async move { sink.expire_loop().await })
        };

        sink.info("one");
        time::sleep(Duration::from_secs(4)).await;
        assert!(sink.visible().is_some());

        // a replacement restarts the clock
        sink.info("two");
        time::sleep(Duration::from_secs(4)).await;
        assert_eq!(sink.visible().unwrap().message, "two");

        time::sleep(Duration::from_secs(3)).await;
        assert!(sink.visible().is_none());

        driver.abort();
    }
}
