use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub severity: Severity,
    /// `None` keeps the banner until it is replaced or cleared.
    pub expires_at: Option<Instant>,
}

impl Banner {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// The one message a page shows at a time.
#[derive(Debug)]
pub struct BannerSlot {
    current: Mutex<Option<Banner>>,
    clear_after: Duration,
}

impl BannerSlot {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            current: Mutex::new(None),
            clear_after,
        }
    }

    /// Show a banner that clears itself after the configured delay.
    pub fn flash(&self, message: impl Into<String>, severity: Severity) {
        self.set(message.into(), severity, Some(Instant::now() + self.clear_after));
    }

    /// Show a banner until the next one replaces it.
    pub fn show(&self, message: impl Into<String>, severity: Severity) {
        self.set(message.into(), severity, None);
    }

    fn set(&self, message: String, severity: Severity, expires_at: Option<Instant>) {
        *self.current.lock() = Some(Banner {
            message,
            severity,
            expires_at,
        });
    }

    pub fn clear(&self) {
        *self.current.lock() = None;
    }

    /// The visible banner; an expired one is dropped on read.
    pub fn current(&self) -> Option<Banner> {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|b| b.is_expired(Instant::now())) {
            *current = None;
        }
        current.clone()
    }

    pub fn message(&self) -> Option<String> {
        self.current().map(|b| b.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn flashed_banners_clear_after_the_delay() {
        let slot = BannerSlot::new(Duration::from_millis(3000));
        slot.flash("Cannot save an empty draft.", Severity::Error);

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert_eq!(slot.message().as_deref(), Some("Cannot save an empty draft."));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(slot.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn shown_banners_persist_until_replaced() {
        let slot = BannerSlot::new(Duration::from_millis(10));
        slot.show("Failed to submit blog. Please try again.", Severity::Error);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(slot.current().is_some());

        slot.flash("Blog submitted successfully!", Severity::Success);
        assert_eq!(slot.current().unwrap().severity, Severity::Success);
        slot.clear();
        assert!(slot.current().is_none());
    }
}
