//! Transient status messages shown in the footer.
//!
//! A message stays visible for its duration unless a newer one replaces it.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    shown_at: Instant,
    duration: Duration,
}

impl StatusMessage {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.duration
    }
}

#[derive(Debug, Default)]
pub struct StatusLine {
    current: Option<StatusMessage>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` for `duration`, replacing any current message
    pub fn show(&mut self, text: impl Into<String>, duration: Duration) {
        self.show_at(text, duration, Instant::now());
    }

    pub fn show_at(&mut self, text: impl Into<String>, duration: Duration, now: Instant) {
        self.current = Some(StatusMessage {
            text: text.into(),
            shown_at: now,
            duration,
        });
    }

    /// Drop the message once its time is up
    pub fn tick(&mut self, now: Instant) {
        if self
            .current
            .as_ref()
            .is_some_and(|message| message.is_expired(now))
        {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|message| message.text.as_str())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_expires_after_duration() {
        let mut status = StatusLine::new();
        let start = Instant::now();
        status.show_at("Saved", Duration::from_secs(3), start);

        status.tick(start + Duration::from_secs(2));
        assert_eq!(status.current(), Some("Saved"));

        status.tick(start + Duration::from_secs(3));
        assert_eq!(status.current(), None);
    }

    #[test]
    fn test_newer_message_supersedes() {
        let mut status = StatusLine::new();
        let start = Instant::now();
        status.show_at("first", Duration::from_secs(1), start);
        status.show_at(
            "second",
            Duration::from_secs(5),
            start + Duration::from_millis(500),
        );

        // The first message's deadline no longer applies
        status.tick(start + Duration::from_secs(2));
        assert_eq!(status.current(), Some("second"));
    }

    #[test]
    fn test_clear() {
        let mut status = StatusLine::new();
        status.show("x", Duration::from_secs(1));
        status.clear();
        assert_eq!(status.current(), None);
    }
}
