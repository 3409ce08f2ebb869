use std::time::Duration;

use log::{debug, warn};

use super::{CompletionClient, CompletionError, CompletionRequest};

/// Bounded retry with exponential backoff for transient completion failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Wraps a [`CompletionClient`] and retries timeouts and unavailability.
/// Refusals are returned immediately.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: CompletionClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<C: CompletionClient> CompletionClient for RetryingClient<C> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let backoff = self.policy.calculate_backoff(attempt - 1);
                debug!(
                    "Completion retry {}/{}, backing off for {:?}",
                    attempt + 1,
                    max_attempts,
                    backoff
                );
                std::thread::sleep(backoff);
            }

            match self.inner.complete(request) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    warn!(
                        "Completion failed on attempt {}/{}: {}",
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns queued results in order, then repeats the last one.
    struct Scripted {
        results: Mutex<Vec<Result<String, CompletionError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<String, CompletionError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CompletionClient for Scripted {
        fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(CompletionError::Unavailable("exhausted".into())))
        }
    }

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts).with_backoff(Duration::from_millis(1), Duration::from_millis(2))
    }

    #[test]
    fn test_retries_timeout_then_succeeds() {
        let inner = Scripted::new(vec![
            Err(CompletionError::Timeout("slow".into())),
            Ok("done".into()),
        ]);
        let client = RetryingClient::new(inner, fast_policy(3));

        assert_eq!(client.complete(&CompletionRequest::new("p")).unwrap(), "done");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_refusal_is_not_retried() {
        let inner = Scripted::new(vec![
            Err(CompletionError::Refused("policy".into())),
            Ok("never".into()),
        ]);
        let client = RetryingClient::new(inner, fast_policy(3));

        let result = client.complete(&CompletionRequest::new("p"));
        assert!(matches!(result, Err(CompletionError::Refused(_))));
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let inner = Scripted::new(vec![
            Err(CompletionError::Unavailable("down".into())),
            Err(CompletionError::Unavailable("down".into())),
            Err(CompletionError::Unavailable("down".into())),
            Ok("too late".into()),
        ]);
        let client = RetryingClient::new(inner, fast_policy(3));

        let result = client.complete(&CompletionRequest::new("p"));
        assert!(matches!(result, Err(CompletionError::Unavailable(_))));
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_default_policy_is_single_attempt() {
        let inner = Scripted::new(vec![Err(CompletionError::Timeout("slow".into()))]);
        let client = RetryingClient::new(inner, RetryPolicy::default());

        assert!(client.complete(&CompletionRequest::new("p")).is_err());
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(10)
            .with_backoff(Duration::from_millis(100), Duration::from_millis(300))
            .with_multiplier(2.0);

        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(100));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(policy.calculate_backoff(5), Duration::from_millis(300));
    }
}
