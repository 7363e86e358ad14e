use std::fmt::Display;
use std::future::Future;

use crate::config::RetryPolicy;

/// Outcome of a retried operation: the final result plus how many attempts it took.
pub struct Attempted<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Runs `operation` until it succeeds or `policy.max_attempts` is reached,
/// sleeping `base_delay * attempt` between attempts. No sleep follows the last one.
pub async fn with_linear_backoff<T, E, F, Fut>(
    label: &str,
    policy: RetryPolicy,
    operation: F,
) -> Attempted<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_when(label, policy, |_| true, operation).await
}

/// Like [`with_linear_backoff`], but gives up at once on errors `should_retry` rejects.
pub async fn retry_when<T, E, P, F, Fut>(
    label: &str,
    policy: RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Attempted<T, E>
where
    E: Display,
    P: Fn(&E) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(err) => {
                log::error!(
                    "{} failed (attempt {}/{}): {}",
                    label,
                    attempt,
                    max_attempts,
                    err
                );
                if attempt >= max_attempts || !should_retry(&err) {
                    return Attempted {
                        result: Err(err),
                        attempts: attempt,
                    };
                }
                let delay = policy.delay_after(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
