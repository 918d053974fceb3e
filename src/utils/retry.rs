use crate::errors::{BundlerError, Result};
use log::warn;
use solana_client::client_error::{ClientError, ClientErrorKind};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff shared by every RPC call site that needs retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let scaled = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Runs `op` until it succeeds, the predicate rejects an error, or attempts run out.
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, mut op: F, is_retryable: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display + Into<BundlerError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(e.into()),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(BundlerError::RetriesExhausted {
                        attempts: attempt,
                        last_error: format!("{}: {}", label, e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!("[{}] attempt {}/{} failed: {}. Retrying in {:?}", label, attempt, self.max_attempts, e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Network and node-side failures are worth retrying; malformed requests,
/// signing problems and transaction errors are not.
pub fn is_transient_client_error(err: &ClientError) -> bool {
    !matches!(
        err.kind(),
        ClientErrorKind::SerdeJson(_) | ClientErrorKind::SigningError(_) | ClientErrorKind::TransactionError(_)
    )
}
