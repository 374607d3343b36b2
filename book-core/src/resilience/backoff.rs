//! Reconnect backoff schedule for the engine's connection loop.
//!
//! Unlike a classic exponential backoff, the schedule here is the exact step function
//! from §4.2: attempts 1-3 retry immediately, attempts 4-7 wait `attempt - 3` seconds,
//! attempt 8 onward wait a flat 5 seconds, and the loop gives up after `max_attempts`.
//! Kept as its own type (not reused from a generic backoff) because the shape doesn't
//! generalize - there's no multiplier or jitter to parameterize.

use std::time::Duration;

/// Configuration for the engine's reconnect schedule.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Attempts (1-indexed) at or below this retry with no delay.
    pub immediate_attempts: usize,
    /// Attempts above `immediate_attempts` and at or below this wait `attempt - immediate_attempts`
    /// seconds.
    pub ramp_attempts: usize,
    /// Flat delay applied once `ramp_attempts` is exceeded.
    pub flat_delay: Duration,
    /// Total attempts before the loop gives up (`None` = unlimited).
    pub max_attempts: Option<usize>,
}

impl Default for BackoffConfig {
    /// The schedule in spec §4.2: attempts 1-3 immediate, 4-7 ramp by one second per
    /// attempt, 8+ flat 5s, give up after 2000 attempts.
    fn default() -> Self {
        Self {
            immediate_attempts: 3,
            ramp_attempts: 7,
            flat_delay: Duration::from_secs(5),
            max_attempts: Some(2000),
        }
    }
}

impl BackoffConfig {
    /// A fast schedule for tests: immediate for 2 attempts, millisecond ramp, short cap.
    pub fn aggressive() -> Self {
        Self {
            immediate_attempts: 2,
            ramp_attempts: 4,
            flat_delay: Duration::from_millis(50),
            max_attempts: Some(10),
        }
    }
}

/// Tracks the current attempt and hands out the delay to wait before the next one.
pub struct ReconnectBackoff {
    config: BackoffConfig,
    current_attempt: usize,
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::with_config(BackoffConfig::default())
    }

    pub fn with_config(config: BackoffConfig) -> Self {
        Self {
            config,
            current_attempt: 0,
        }
    }

    /// Advances to the next attempt and returns how long to wait before it, or `None`
    /// if `max_attempts` has been exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(max) = self.config.max_attempts {
            if self.current_attempt >= max {
                return None;
            }
        }

        self.current_attempt += 1;
        let attempt = self.current_attempt;

        let delay = if attempt <= self.config.immediate_attempts {
            Duration::ZERO
        } else if attempt <= self.config.ramp_attempts {
            Duration::from_secs((attempt - self.config.immediate_attempts) as u64)
        } else {
            self.config.flat_delay
        };

        Some(delay)
    }

    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }

    pub fn attempt_number(&self) -> usize {
        self.current_attempt
    }

    pub fn can_retry(&self) -> bool {
        match self.config.max_attempts {
            Some(max) => self.current_attempt < max,
            None => true,
        }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new()
    }
}
