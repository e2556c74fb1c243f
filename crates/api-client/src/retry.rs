use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ClientError;

/// How many times one logical call may be attempted when it times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Never below 1.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
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

    /// Single attempt, no retry.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Run `attempt` until it succeeds, fails with anything other than a
/// timeout, or the policy is exhausted.
///
/// Only [`ClientError::Timeout`] is retried. Connection failures and HTTP
/// statuses are returned immediately.
pub async fn retry_on_timeout<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut attempt: F,
) -> Result<T, ClientError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut n = 1;
    loop {
        match attempt(n).await {
            Err(ClientError::Timeout) if n < max_attempts => {
                warn!(
                    "{} attempt {}/{} timed out, retrying in {}ms…",
                    label,
                    n,
                    max_attempts,
                    policy.delay.as_millis(),
                );
                tokio::time::sleep(policy.delay).await;
                n += 1;
            }
            Err(ClientError::Timeout) => {
                warn!("{} timed out after {} attempts", label, max_attempts);
                return Err(ClientError::Timeout);
            }
            other => return other,
        }
    }
}
