use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// 可替換的睡眠實作，測試時注入假的 Sleeper 以避免真正等待
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

pub trait Backoff: Send + Sync {
    /// `attempt` 從 1 開始，代表剛失敗的那一次
    fn delay(&self, attempt: u32) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: Option<u32>,
    backoff: Arc<dyn Backoff>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicy {
    /// `max_attempts = None` retries forever.
    pub fn new(max_attempts: Option<u32>, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            max_attempts,
            backoff,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn fixed(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self::new(max_attempts, Arc::new(FixedBackoff::new(delay)))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("✅ {} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        return Err(ScanError::RetryExhausted {
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }

                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(
                        "🔄 {} failed (attempt {}): {}. Retrying in {:?}",
                        label,
                        attempt,
                        e,
                        delay
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }
}
