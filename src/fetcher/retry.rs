//! Retry with exponential backoff and jitter
//!
//! delay(n) = min(base * 2^n, max), then spread by ±jitter_ratio.

use crate::config::RetryConfig;
use crate::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry schedule for one fetch strategy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of each delay applied as random spread
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_ratio: config.jitter_ratio.clamp(0.0, 1.0),
        }
    }

    /// A policy that makes exactly one attempt
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0 for the first retry), without jitter
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay before retry number `retry`, with jitter applied
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = self.backoff(retry);
        if self.jitter_ratio <= 0.0 || delay.is_zero() {
            return delay;
        }
        let spread = rand::thread_rng().gen_range(-self.jitter_ratio..=self.jitter_ratio);
        delay.mul_f64((1.0 + spread).max(0.0))
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out
    ///
    /// `op` receives the zero-based attempt index. `retryable` decides whether
    /// an error is worth another attempt.
    ///
    /// # Returns
    ///
    /// * `Ok((value, attempts))` - Success and the number of attempts it took
    /// * `Err(FetchError)` - The last error seen
    pub async fn run<T, F, Fut, R>(&self, mut op: F, retryable: R) -> Result<(T, u32), FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        R: Fn(&FetchError) -> bool,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok((value, attempt + 1)),
                Err(err) => {
                    let remaining = attempt + 1 < self.max_attempts;
                    if !remaining || !retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Attempt {}/{} failed ({}): {}; retrying in {}ms",
                        attempt + 1,
                        self.max_attempts,
                        err.kind(),
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl FetchError {
    /// Short classification label used in logs and tool output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connection { .. } => "connection",
            Self::HttpStatus { .. } => "http-status",
            Self::Blocked { .. } => "blocked",
            Self::Browser { .. } => "browser",
            Self::ClientBuild(_) => "client-build",
            Self::BlockedDomain { .. } => "blocked-domain",
            Self::Request { .. } => "request",
            Self::AllStrategiesFailed { .. } => "all-strategies-failed",
        }
    }

    /// Returns true if another attempt may succeed
    ///
    /// Timeouts, connection failures, 429 and 5xx are transient. A 403 block
    /// is only worth retrying in stealth mode, where the identity changes
    /// between attempts.
    pub fn is_transient(&self, stealth: bool) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Blocked { .. } => stealth,
            _ => false,
        }
    }

    /// Classifies a reqwest error for the given URL
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_connect() {
            Self::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::from_status(url, status.as_u16())
        } else {
            Self::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Error for a non-success HTTP status
    pub fn from_status(url: &str, status: u16) -> Self {
        match status {
            401 | 403 => Self::Blocked {
                url: url.to_string(),
                status,
            },
            _ => Self::HttpStatus {
                url: url.to_string(),
                status,
            },
        }
    }
}
