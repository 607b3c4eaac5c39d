//! Retry Executor
//!
//! Runs a fallible async operation with bounded retries. The loop is a
//! small state machine over an injected [`Sleeper`] so tests can drive it
//! without real time passing, and a [`CancellationToken`] lets the caller
//! abandon it between attempts or mid-backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use plexiglass_core::{Error, PerformanceSettings, Result};

use super::error_handler::ErrorClassifier;

/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default total number of attempts
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// How many attempts to make and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub retry_count: u32,
    pub base_delay: Duration,
    /// Double the delay after every failed attempt
    pub exponential: bool,
}

impl RetryPolicy {
    pub fn new(retry_count: u32, base_delay: Duration) -> Self {
        Self {
            retry_count,
            base_delay,
            exponential: false,
        }
    }

    pub fn from_settings(settings: &PerformanceSettings) -> Self {
        Self::new(settings.max_retries, DEFAULT_BASE_DELAY)
    }

    pub fn with_exponential_backoff(mut self, exponential: bool) -> Self {
        self.exponential = exponential;
        self
    }

    /// Delay after the zero-based `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.base_delay;
        }
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// A zero count still runs the operation once
    fn max_attempts(&self) -> u32 {
        self.retry_count.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_COUNT, DEFAULT_BASE_DELAY)
    }
}

/// Scheduler-agnostic sleep primitive
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A failed attempt waiting for its backoff to elapse
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    /// 1-based number of the attempt that failed
    pub attempt_number: u32,
    pub error: Error,
    pub delay_before_next: Duration,
}

enum Step {
    Run,
    Wait(RetryAttempt),
}

/// Executes operations under a [`RetryPolicy`]
pub struct RetryExecutor {
    policy: RetryPolicy,
    classifier: Arc<ErrorClassifier>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, classifier: Arc<ErrorClassifier>) -> Self {
        Self {
            policy,
            classifier,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &Arc<ErrorClassifier> {
        &self.classifier
    }

    /// Run `operation` under the executor's own policy
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: F,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = self.policy;
        self.execute_with_policy(&policy, operation, cancel).await
    }

    /// Run `operation` under an explicit policy.
    ///
    /// Returns the first success. Non-retryable errors are returned without
    /// waiting; once all attempts are spent the last error is returned.
    pub async fn execute_with_policy<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        mut operation: F,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = policy.max_attempts();
        let mut failed: u32 = 0;
        let mut step = Step::Run;

        loop {
            step = match step {
                Step::Run => {
                    if cancel.is_cancelled() {
                        debug!("[RetryExecutor] Cancelled before attempt {}", failed + 1);
                        return Err(Error::Cancelled);
                    }

                    let error = match operation().await {
                        Ok(value) => {
                            if failed > 0 {
                                debug!("[RetryExecutor] Succeeded on attempt {}", failed + 1);
                            }
                            return Ok(value);
                        }
                        Err(error) => error,
                    };

                    if !self.classifier.is_retryable(&error) {
                        debug!("[RetryExecutor] Not retrying {}: {}", error.kind(), error);
                        return Err(error);
                    }

                    let delay = policy.delay_for(failed);
                    failed += 1;
                    if failed >= max_attempts {
                        warn!(
                            "[RetryExecutor] Giving up after {} attempts: {}",
                            failed, error
                        );
                        return Err(error);
                    }

                    Step::Wait(RetryAttempt {
                        attempt_number: failed,
                        error,
                        delay_before_next: delay,
                    })
                }
                Step::Wait(attempt) => {
                    warn!(
                        attempt = attempt.attempt_number,
                        delay_ms = attempt.delay_before_next.as_millis() as u64,
                        "[RetryExecutor] Attempt failed, retrying: {}",
                        attempt.error
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!("[RetryExecutor] Cancelled during backoff");
                            return Err(Error::Cancelled);
                        }
                        _ = self.sleeper.sleep(attempt.delay_before_next) => Step::Run,
                    }
                }
            };
        }
    }
}
