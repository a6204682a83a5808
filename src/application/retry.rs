use std::thread;
use std::time::Duration;

use log::debug;

use crate::domain::errors::DomainError;

/// How often and how patiently a unit of work is re-run after a retryable
/// store error.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per operation before a transient failure is handed to the caller.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Add up to 25% random jitter so colliding callers spread out.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Sleep before attempt `attempt + 1`, given that `attempt` (1-based) failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * 2_f64.powi(attempt.saturating_sub(1) as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);
        let delay = if self.jitter {
            capped + rand::random::<f64>() * capped * 0.25
        } else {
            capped
        };
        Duration::from_millis(delay as u64)
    }
}

/// Re-runs `op` with the default policy while it fails with a retryable error.
///
/// Each attempt must be a complete transaction, so a retry starts from
/// freshly committed state and re-checks every guard.
pub fn retry_transient<T, F>(operation: &str, op: F) -> Result<T, DomainError>
where
    F: FnMut() -> Result<T, DomainError>,
{
    retry_with(&RetryPolicy::default(), operation, op)
}

pub fn retry_with<T, F>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Result<T, DomainError>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                debug!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    operation, attempt, policy.max_attempts, delay, err
                );
                thread::sleep(delay);
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn immediate() -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::ZERO,
            jitter: false,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn retries_transient_errors_until_success() {
        let calls = Cell::new(0);
        let result = retry_with(&immediate(), "test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(DomainError::Transient("conflict".into()))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let policy = immediate();
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_with(&policy, "test", || {
            calls.set(calls.get() + 1);
            Err(DomainError::Transient("conflict".into()))
        });
        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.get(), policy.max_attempts);
    }

    #[test]
    fn domain_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_transient("test", || {
            calls.set(calls.get() + 1);
            Err(DomainError::Validation("bad".into()))
        });
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn delay_grows_exponentially_up_to_the_cap() {
        let policy = RetryPolicy {
            jitter: false,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
        assert_eq!(policy.delay_after(2), Duration::from_millis(20));
        assert_eq!(policy.delay_after(4), Duration::from_millis(80));
        assert_eq!(policy.delay_after(12), Duration::from_millis(500));
    }

    #[test]
    fn jitter_stays_within_a_quarter_of_the_delay() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay_after(3);
            assert!(delay >= Duration::from_millis(40));
            assert!(delay <= Duration::from_millis(50));
        }
    }
}
