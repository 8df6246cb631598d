//! Capped exponential backoff for transient network failures.

use std::{fmt::Display, future::Future, time::Duration};

use log::warn;
use serde::Deserialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use tokio::time::sleep;
use typed_builder::TypedBuilder;

#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Debug, TypedBuilder, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Backoff {
    /// Total number of tries, including the first one.  Zero is treated as one.
    pub max_attempts: u32,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub initial_delay: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(120),
        }
    }
}

/// The last error of an operation that never succeeded.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

impl Backoff {
    /// Delay after the failure of the given (0-indexed) attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, Exhausted<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            attempt += 1;
            if attempt >= max_attempts {
                return Err(Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            let delay = self.delay_after(attempt - 1);
            warn!("{error}");
            warn!("Retrying in {delay:?} (attempt {attempt}/{max_attempts} failed)");
            sleep(delay).await;
        }
    }
}
