//! Heartbeat freshness tracking (invariant I5).
//!
//! One engine keeps a single [`HeartbeatMonitor`], refreshed whenever any mutation
//! (including a bare `Heartbeat`) is applied to any configured market. The window is
//! supplied per check rather than fixed at construction, since the query surface
//! accepts an optional `heartbeat_window` on every call; a silently-dead feed then
//! surfaces as [`crate::OutOfSyncError::Stale`] instead of quietly returning
//! increasingly outdated levels.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

#[derive(Debug)]
pub struct HeartbeatMonitor {
    last_seen: Option<Instant>,
}

impl HeartbeatMonitor {
    pub fn new() -> Self {
        Self { last_seen: None }
    }

    /// Records that a mutation was just applied to the watched market.
    pub fn mark_seen(&mut self) {
        self.last_seen = Some(Instant::now());
    }

    /// `None` means no mutation has ever been applied (still initialising).
    pub fn freshness(&self, window: Duration) -> Option<Freshness> {
        let last_seen = self.last_seen?;
        if last_seen.elapsed() <= window {
            Some(Freshness::Fresh)
        } else {
            Some(Freshness::Stale)
        }
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        matches!(self.freshness(window), Some(Freshness::Fresh))
    }

    /// Age of the last observed mutation, if any.
    pub fn age(&self) -> Option<Duration> {
        self.last_seen.map(|t| t.elapsed())
    }

    pub fn reset(&mut self) {
        self.last_seen = None;
    }
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_seen_has_no_freshness() {
        let monitor = HeartbeatMonitor::new();
        assert_eq!(monitor.freshness(Duration::from_secs(5)), None);
        assert!(!monitor.is_fresh(Duration::from_secs(5)));
    }

    #[test]
    fn freshly_marked_is_fresh() {
        let mut monitor = HeartbeatMonitor::new();
        monitor.mark_seen();
        assert!(monitor.is_fresh(Duration::from_secs(5)));
    }

    #[test]
    fn exceeding_window_is_stale() {
        let mut monitor = HeartbeatMonitor::new();
        monitor.mark_seen();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(monitor.freshness(Duration::from_millis(20)), Some(Freshness::Stale));
    }

    #[test]
    fn reset_returns_to_never_seen() {
        let mut monitor = HeartbeatMonitor::new();
        monitor.mark_seen();
        monitor.reset();
        assert_eq!(monitor.freshness(Duration::from_secs(5)), None);
    }
}
