//! Jitter applied to restart delays.
//!
//! [`Jitter`] randomizes backoff delays so that several tasks failing at once
//! do not all retry at the same instant.
//!
//! - [`Jitter::None`] no randomization, predictable delays
//! - [`Jitter::Full`] random delay in `[0, delay]`
//! - [`Jitter::Equal`] `delay/2 + random[0, delay/2]`

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of restart delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Use the exact computed delay.
    #[default]
    None,
    /// Random delay in `[0, delay]`.
    Full,
    /// `delay/2` plus a random half, preserving most of the delay.
    Equal,
}

impl Jitter {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            Jitter::Equal => {
                let half = ms / 2;
                let jitter = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + jitter)
            }
        }
    }
}
