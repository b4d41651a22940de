use std::time::Duration;

/// Status codes at or above this value indicate a service outage.
const SERVICE_OUTAGE_THRESHOLD: u16 = 500;

/// RetryPolicy for calls to the tracking service
///
/// A fixed number of attempts with a fixed pause between them. Responses
/// below the outage threshold that are not successful are retried; an
/// outage status ends the call at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Whether a status means the service itself is down.
    pub fn is_outage(status: u16) -> bool {
        status >= SERVICE_OUTAGE_THRESHOLD
    }

    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_outage_classification() {
        assert!(RetryPolicy::is_outage(500));
        assert!(RetryPolicy::is_outage(503));
        assert!(!RetryPolicy::is_outage(499));
        assert!(!RetryPolicy::is_outage(404));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.has_attempts_left(1));
    }
}
