use std::str::FromStr;
use std::time::Duration;

/// Engine timing configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long an assignee has to confirm before the task moves on.
    pub escalation_timeout: Duration,
    /// Shift applied to "now" when recording a watering, so stored times
    /// line up with the display timezone.
    pub display_offset: chrono::Duration,
    /// Rows per page when loading distance pairs.
    pub distance_page_size: i64,
    pub assignment_interval: Duration,
    pub distance_refresh_interval: Duration,
    pub timeout_sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            escalation_timeout: Duration::from_secs(30 * 60),
            display_offset: chrono::Duration::zero(),
            distance_page_size: 1000,
            assignment_interval: Duration::from_secs(300),
            distance_refresh_interval: Duration::from_secs(24 * 3600),
            timeout_sweep_interval: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables. Unparsable values
    /// fall back to the default with a warning.
    ///
    /// | Env Var                           | Default |
    /// |-----------------------------------|---------|
    /// | `ESCALATION_TIMEOUT_SECS`         | `1800`  |
    /// | `DISPLAY_UTC_OFFSET_MINUTES`      | `0`     |
    /// | `DISTANCE_PAGE_SIZE`              | `1000`  |
    /// | `ASSIGNMENT_INTERVAL_SECS`        | `300`   |
    /// | `DISTANCE_REFRESH_INTERVAL_SECS`  | `86400` |
    /// | `TIMEOUT_SWEEP_INTERVAL_SECS`     | `60`    |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            escalation_timeout: Duration::from_secs(env_or(
                "ESCALATION_TIMEOUT_SECS",
                defaults.escalation_timeout.as_secs(),
            )),
            display_offset: display_offset_from(env_or("DISPLAY_UTC_OFFSET_MINUTES", 0i64)),
            distance_page_size: env_or("DISTANCE_PAGE_SIZE", defaults.distance_page_size).max(1),
            assignment_interval: Duration::from_secs(env_or(
                "ASSIGNMENT_INTERVAL_SECS",
                defaults.assignment_interval.as_secs(),
            )),
            distance_refresh_interval: Duration::from_secs(env_or(
                "DISTANCE_REFRESH_INTERVAL_SECS",
                defaults.distance_refresh_interval.as_secs(),
            )),
            timeout_sweep_interval: Duration::from_secs(env_or(
                "TIMEOUT_SWEEP_INTERVAL_SECS",
                defaults.timeout_sweep_interval.as_secs(),
            )),
        }
    }

    /// The escalation timeout as a chrono duration, for timestamp math.
    pub fn escalation_window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.escalation_timeout)
            .unwrap_or_else(|_| chrono::Duration::minutes(30))
    }
}

/// Minutes outside chrono's range fall back to no offset.
fn display_offset_from(minutes: i64) -> chrono::Duration {
    chrono::Duration::try_minutes(minutes).unwrap_or_else(|| {
        tracing::warn!(
            key = "DISPLAY_UTC_OFFSET_MINUTES",
            minutes,
            "Display offset out of range, using 0"
        );
        chrono::Duration::zero()
    })
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw, %default, "Invalid config value, using default");
        default
    })
}
