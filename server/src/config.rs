use std::{env, str::FromStr, time::Duration};

/// Reads `key` from the environment, falling back to `default` when unset or unparsable.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Durations of the round, expressed in time units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub time_unit: Duration,
    pub countdown_units: f64,
    pub spawn_units: f64,
    pub expiry_base_units: f64,
    pub expiry_jitter_units: f64,
    pub squash_units: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
            countdown_units: 1.0,
            spawn_units: 0.6,
            expiry_base_units: 1.0,
            expiry_jitter_units: 1.0,
            squash_units: 0.5,
        }
    }
}

impl Timing {
    pub fn from_env() -> Self {
        let unit_ms: u64 = env_or("BUGBASH_TIME_UNIT_MS", 1000);
        Self {
            time_unit: Duration::from_millis(unit_ms.max(1)),
            ..Self::default()
        }
    }

    pub fn countdown_period(&self) -> Duration {
        self.scaled(self.countdown_units)
    }

    pub fn spawn_period(&self) -> Duration {
        self.scaled(self.spawn_units)
    }

    /// Lifetime of a spawned entity for a roll in `[0, 1)`.
    pub fn lifetime(&self, roll: f64) -> Duration {
        self.scaled(self.expiry_base_units + self.expiry_jitter_units * roll)
    }

    pub fn squash_duration(&self) -> Duration {
        self.scaled(self.squash_units)
    }

    fn scaled(&self, units: f64) -> Duration {
        self.time_unit.mul_f64(units.max(0.0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CleanupSettings {
    pub interval_secs: u64,
    pub inactive_timeout_secs: u64,
}

impl CleanupSettings {
    pub fn from_env() -> Self {
        Self {
            interval_secs: env_or("BUGBASH_CLEANUP_INTERVAL_SECONDS", 60u64).max(1),
            inactive_timeout_secs: env_or("BUGBASH_INACTIVE_GAME_TIMEOUT_SECONDS", 600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_scale_with_the_time_unit() {
        let timing = Timing {
            time_unit: Duration::from_millis(100),
            ..Timing::default()
        };
        assert_eq!(timing.countdown_period(), Duration::from_millis(100));
        assert_eq!(timing.squash_duration(), Duration::from_millis(50));
        assert_eq!(timing.lifetime(0.0), Duration::from_millis(100));
        assert!(timing.lifetime(0.999) < Duration::from_millis(200));
    }

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(env_or("BUGBASH_SURELY_UNSET_VARIABLE", 42u32), 42);
    }
}
