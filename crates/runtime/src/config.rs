//! Runtime configuration and environment loader.
use std::env;
use std::time::Duration;

use combat_core::CombatConfig;

use crate::admission::{DEFAULT_CAPACITY, PROTOCOL_VERSION};

/// Pacing of attack-resolution sequences.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequenceTiming {
    /// Delay before each hit of a single-target sequence.
    pub short_delay: Duration,
    /// Delay before each hit of a sweep.
    pub long_delay: Duration,
    /// Wait after pre-empting a running sequence.
    pub settle_delay: Duration,
    /// Multiplier applied to every delay; 0 disables pacing.
    pub time_dilation: f32,
}

impl SequenceTiming {
    pub fn hit_delay(&self, sweep: bool) -> Duration {
        self.scaled(if sweep {
            self.long_delay
        } else {
            self.short_delay
        })
    }

    pub fn settle(&self) -> Duration {
        self.scaled(self.settle_delay)
    }

    fn scaled(&self, delay: Duration) -> Duration {
        if self.time_dilation.is_finite() && self.time_dilation >= 0.0 {
            let nanos = delay.as_nanos() as f64 * f64::from(self.time_dilation);
            Duration::from_nanos(nanos.round() as u64)
        } else {
            delay
        }
    }
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            short_delay: Duration::from_millis(350),
            long_delay: Duration::from_millis(600),
            settle_delay: Duration::from_millis(100),
            time_dilation: 1.0,
        }
    }
}

/// Configuration for a participant runtime.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Per-link message buffer of relay connections.
    pub link_buffer_size: usize,
    pub timing: SequenceTiming,
    /// Quiet period after a roster-changing command before the round check.
    pub round_check_debounce: Duration,
    /// Seed for this participant's dice; rolls happen only on the issuer.
    pub session_seed: u64,
    pub protocol_version: u32,
    /// Maximum participants, host included.
    pub capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            link_buffer_size: 64,
            timing: SequenceTiming::default(),
            round_check_debounce: Duration::from_millis(250),
            session_seed: 0,
            protocol_version: PROTOCOL_VERSION,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Overrides defaults from process environment variables.
    ///
    /// - `COMBAT_EVENT_BUFFER` / `COMBAT_COMMAND_BUFFER` / `COMBAT_LINK_BUFFER`
    /// - `COMBAT_SHORT_DELAY_MS` / `COMBAT_LONG_DELAY_MS` / `COMBAT_SETTLE_DELAY_MS`
    /// - `COMBAT_TIME_DILATION`
    /// - `COMBAT_ROUND_DEBOUNCE_MS`
    /// - `COMBAT_SESSION_SEED`
    /// - `COMBAT_CAPACITY`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(size) = read_env::<usize>("COMBAT_EVENT_BUFFER") {
            config.event_buffer_size = size.max(1);
        }
        if let Some(size) = read_env::<usize>("COMBAT_COMMAND_BUFFER") {
            config.command_buffer_size = size.max(1);
        }
        if let Some(size) = read_env::<usize>("COMBAT_LINK_BUFFER") {
            config.link_buffer_size = size.max(1);
        }

        if let Some(ms) = read_env::<u64>("COMBAT_SHORT_DELAY_MS") {
            config.timing.short_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("COMBAT_LONG_DELAY_MS") {
            config.timing.long_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("COMBAT_SETTLE_DELAY_MS") {
            config.timing.settle_delay = Duration::from_millis(ms);
        }
        if let Some(factor) = read_env::<f32>("COMBAT_TIME_DILATION")
            && factor.is_finite()
            && factor >= 0.0
        {
            config.timing.time_dilation = factor;
        }
        if let Some(ms) = read_env::<u64>("COMBAT_ROUND_DEBOUNCE_MS") {
            config.round_check_debounce = Duration::from_millis(ms);
        }

        if let Some(seed) = read_env::<u64>("COMBAT_SESSION_SEED") {
            config.session_seed = seed;
        }
        if let Some(capacity) = read_env::<usize>("COMBAT_CAPACITY") {
            config.capacity = capacity.max(1);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweeps_use_the_long_delay() {
        let timing = SequenceTiming::default();
        assert_eq!(timing.hit_delay(true), Duration::from_millis(600));
        assert_eq!(timing.hit_delay(false), Duration::from_millis(350));
    }

    #[test]
    fn dilation_scales_every_delay() {
        let timing = SequenceTiming {
            time_dilation: 0.5,
            ..SequenceTiming::default()
        };
        assert_eq!(timing.hit_delay(false), Duration::from_millis(175));
        assert_eq!(timing.settle(), Duration::from_millis(50));

        let frozen = SequenceTiming {
            time_dilation: 0.0,
            ..SequenceTiming::default()
        };
        assert_eq!(frozen.hit_delay(true), Duration::ZERO);
    }

    #[test]
    fn invalid_dilation_falls_back_to_real_time() {
        let timing = SequenceTiming {
            time_dilation: f32::NAN,
            ..SequenceTiming::default()
        };
        assert_eq!(timing.hit_delay(false), Duration::from_millis(350));
    }
}
