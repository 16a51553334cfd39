use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt + 1`, counting the first attempt as 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.backoff_factor.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let nanos = (self.initial_delay.as_nanos() as f64 * exp).min(self.max_delay.as_nanos() as f64);
        Duration::from_nanos(nanos.round() as u64)
    }
}

/// Runs `f` until it succeeds or `max_attempts` is reached, returning the
/// last error. At least one attempt is always made.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, label: &str, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                let delay = config.delay_after(attempt);
                tracing::debug!(
                    target_name = label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
