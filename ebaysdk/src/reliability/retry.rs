//! Exponential backoff retry logic for transient failures.
//!
//! Retries are opt-in: the default policy makes a single attempt. Setting the
//! `retries` config key adds that many extra attempts for errors accepted by
//! [`is_retryable`].

use std::time::Duration;

use crate::{EbayError, config::Config};

/// Backoff schedule for a connection.
///
/// Attempt `n` (zero-based) waits `initial_delay * backoff_multiplier^n`
/// before the next try, never more than `max_delay`.
///
/// ```
/// use std::time::Duration;
///
/// use ebaysdk::reliability::RetryPolicy;
///
/// assert_eq!(RetryPolicy::default().max_attempts, 1);
///
/// let patient =
///     RetryPolicy { max_delay: Duration::from_secs(30), ..RetryPolicy::with_max_attempts(4) };
/// assert_eq!(patient.max_attempts, 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts including the first one; 1 disables retries.
    pub max_attempts: u32,
    /// Wait after the first failure.
    pub initial_delay: Duration,
    /// Upper bound for any single wait.
    pub max_delay: Duration,
    /// Growth factor applied per failed attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Default delays with `max_attempts` attempts (at least one).
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), ..Self::default() }
    }

    /// Builds the policy from the `retries` config key.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let retries = config.get_u64("retries").unwrap_or(0);
        let retries = u32::try_from(retries).unwrap_or(u32::MAX - 1);
        Self::with_max_attempts(retries.saturating_add(1))
    }

    /// Wait after the failed attempt number `attempt` (zero-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        #[allow(clippy::cast_precision_loss, reason = "acceptable for duration calculations")]
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        if !delay_ms.is_finite() {
            return self.max_delay;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "delay_ms is finite and non-negative"
        )]
        let delay = Duration::from_millis(delay_ms.max(0.0) as u64);
        delay.min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds, `should_retry` rejects its error, or
/// the policy runs out of attempts.
///
/// ```
/// use std::time::Duration;
///
/// use ebaysdk::{EbayError, reliability::{RetryPolicy, is_retryable, retry_with_backoff}};
///
/// # async fn example() {
/// let policy = RetryPolicy {
///     initial_delay: Duration::from_millis(1),
///     ..RetryPolicy::with_max_attempts(3)
/// };
/// let mut timeouts = 2;
///
/// let reply = retry_with_backoff(&policy, is_retryable, || {
///     let outcome = if timeouts > 0 {
///         timeouts -= 1;
///         let after = Duration::from_secs(20);
///         Err(EbayError::Timeout { verb: "getVersion".to_owned(), after })
///     } else {
///         Ok("1.13.0")
///     };
///     async move { outcome }
/// })
/// .await;
///
/// assert_eq!(reply.ok(), Some("1.13.0"));
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error once all attempts fail, or the first error that
/// `should_retry` rejects.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "call succeeded after retrying");
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt + 1 >= max_attempts || !should_retry(&error) {
                    return Err(error);
                }

                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Returns `true` for timeouts, refused connections and 5xx replies.
///
/// `ack` failures, 4xx replies and request building errors fail the same way
/// on every attempt and are never retried.
#[must_use]
pub fn is_retryable(error: &EbayError) -> bool {
    match error {
        EbayError::HttpError(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        EbayError::Timeout { .. } => true,
        EbayError::ConnectionError { response, .. } => {
            response.as_ref().is_some_and(|r| r.status_code() >= 500)
        }
        EbayError::InvalidParameter(_)
        | EbayError::UnsupportedCall { .. }
        | EbayError::Config(_)
        | EbayError::Auth(_)
        | EbayError::Parse(_)
        | EbayError::TaskFailed(_) => false,
    }
}
