use std::time::Duration;

use workpass_core::config::RetryConfig;
use workpass_core::error::{codes, AppError};

/// Blocking pause between attempts. Tests substitute a recording fake.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Bounded exponential backoff. Only errors whose code is listed in
/// `retry_on` are retried; anything else is returned on the first failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub retry_on: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            multiplier: cfg.multiplier,
            retry_on: vec![codes::AI_RATE_LIMITED.to_string()],
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            retry_on: Vec::new(),
        }
    }

    /// Delay after the `attempt`-th failure (1-based): base * multiplier^(attempt-1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        self.base_delay.mul_f64(self.multiplier.powi(exp))
    }

    pub fn qualifies(&self, err: &AppError) -> bool {
        self.retry_on.iter().any(|c| c == &err.code)
    }

    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        label: &str,
        mut op: impl FnMut() -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut attempt = 1u32;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if self.qualifies(&e) => {
                    if attempt >= self.max_attempts {
                        return Err(AppError::new(
                            codes::AI_RATE_LIMIT_EXHAUSTED,
                            format!("{label} failed after {attempt} attempts due to rate limits"),
                        )
                        .with_details(format!(
                            "last_error={e}; check the provider quota before rebuilding"
                        )));
                    }
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "{label}: rate limited (attempt {attempt}/{}); waiting {:?} before retry",
                        self.max_attempts,
                        delay
                    );
                    sleeper.sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
