//! Cooperative cancellation via wall-clock deadlines (spec §5).
//!
//! A [`Deadline`] is propagated through the [`crate::rules::TransformationContext`]
//! and the batch executor. Rules must call [`Deadline::check`] at least
//! once per outer loop iteration and abort cleanly on
//! [`DeadlineExceeded`].

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded;

impl std::fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "processing deadline exceeded")
    }
}

impl std::error::Error for DeadlineExceeded {}

/// A wall-clock point after which cooperative work should abort.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline: `check` never fails.
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn after(duration: Duration) -> Self {
        Self {
            at: Some(Instant::now() + duration),
        }
    }

    pub fn check(&self) -> Result<(), DeadlineExceeded> {
        match self.at {
            Some(at) if Instant::now() >= at => Err(DeadlineExceeded),
            _ => Ok(()),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.check().is_err()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn no_deadline_never_expires() {
        assert!(Deadline::none().check().is_ok());
    }

    #[test]
    fn deadline_expires_after_duration() {
        let deadline = Deadline::after(Duration::from_millis(5));
        sleep(Duration::from_millis(20));
        assert!(deadline.check().is_err());
    }

    #[test]
    fn deadline_not_yet_expired() {
        let deadline = Deadline::after(Duration::from_secs(10));
        assert!(deadline.check().is_ok());
    }
}
