//! Bounded retry for providers that come back with nothing.

use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use tracing::{debug, warn};

use super::provider::Provider;
use crate::error::ProviderError;
use crate::prompt::NeutralMessage;

/// Total attempts per generation, including the first.
pub const MAX_ATTEMPTS: u32 = 5;
const RETRY_DELAY_MS: u64 = 500;

/// Call `provider` until it returns text, retrying only empty results.
///
/// `notify(attempt, retries)` runs before each retry, e.g. `(1, 4)` after the
/// first empty response. Any other error is returned immediately. When every
/// attempt comes back empty the last error is wrapped in
/// [`ProviderError::RetriesExhausted`].
pub async fn generate_with_retry<P, N>(
    provider: &P,
    messages: &[NeutralMessage],
    temperature: f64,
    mut notify: N,
) -> Result<String, ProviderError>
where
    P: Provider + ?Sized,
    N: FnMut(u32, u32),
{
    let mut backoff = Constant::new(Duration::from_millis(RETRY_DELAY_MS));
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < MAX_ATTEMPTS {
        attempts += 1;
        debug!(provider = provider.name(), attempt = attempts, "Generating");

        match provider.generate(messages, temperature).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() => {
                warn!("{e} (attempt {attempts}/{MAX_ATTEMPTS})");
                last_error = Some(e);

                if attempts < MAX_ATTEMPTS
                    && let Some(wait) = backoff.next_backoff()
                {
                    notify(attempts, MAX_ATTEMPTS - 1);
                    tokio::time::sleep(wait).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    let last = last_error.unwrap_or_else(|| ProviderError::EmptyResult {
        provider: provider.name().to_string(),
    });
    Err(ProviderError::RetriesExhausted {
        attempts,
        last: Box::new(last),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::MockProvider;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn empty() -> ProviderError {
        ProviderError::EmptyResult {
            provider: "mock".to_string(),
        }
    }

    fn mock_with(results: Vec<Result<String, ProviderError>>) -> (MockProvider, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut results = results.into_iter();

        let mut mock = MockProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_generate().returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            results.next().unwrap_or_else(|| Err(empty()))
        });
        (mock, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_first_attempt() {
        let (mock, calls) = mock_with(vec![Ok("feat: x".to_string())]);
        let mut notices = Vec::new();

        let result = generate_with_retry(&mock, &[], 0.2, |a, m| notices.push((a, m))).await;

        assert_eq!(result.unwrap(), "feat: x");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(notices.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_empty_results() {
        let (mock, calls) = mock_with(vec![Err(empty()), Err(empty()), Ok("fix: y".to_string())]);
        let mut notices = Vec::new();

        let result = generate_with_retry(&mock, &[], 0.2, |a, m| notices.push((a, m))).await;

        assert_eq!(result.unwrap(), "fix: y");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(notices, vec![(1, 4), (2, 4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_max_attempts() {
        let (mock, calls) = mock_with(vec![]);
        let mut notices = Vec::new();

        let result = generate_with_retry(&mock, &[], 0.2, |a, m| notices.push((a, m))).await;

        assert!(matches!(
            result,
            Err(ProviderError::RetriesExhausted { attempts: MAX_ATTEMPTS, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert_eq!(notices.len(), (MAX_ATTEMPTS - 1) as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let (mock, calls) = mock_with(vec![Err(ProviderError::Status {
            provider: "mock".to_string(),
            status: 401,
            body: "unauthorized".to_string(),
        })]);

        let result = generate_with_retry(&mock, &[], 0.2, |_, _| {}).await;

        assert!(matches!(result, Err(ProviderError::Status { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_between_attempts() {
        let (mock, _calls) = mock_with(vec![Err(empty()), Ok("ok".to_string())]);
        let start = tokio::time::Instant::now();

        generate_with_retry(&mock, &[], 0.2, |_, _| {}).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(RETRY_DELAY_MS));
    }
}
