use super::error::{ModerationError, PitResult};
use super::penalty::{PenaltyCurve, SEVERITY_LEVELS};
use chrono::Duration;

const MS_PER_HOUR: f64 = 3_600_000.0;
/// Ten years. Keeps every derived release time inside chrono's range.
const MAX_HOURS: f64 = 87_600.0;
const MAX_ESCALATION: f64 = 100.0;
const MAX_SECONDS: f64 = 86_400.0;

/// Tunables of the pit engine. Built once at startup and handed to `PitService`.
#[derive(Debug, Clone)]
pub struct PitConfig {
    /// Lookback window after which a strike expires unless chained to a newer one.
    pub horizon: Duration,
    pub curve: PenaltyCurve,
    /// How often the sweep runner re-checks at-risk users.
    pub sweep_interval: std::time::Duration,
    /// Upper bound accepted for self and manual timeouts.
    pub max_timeout: Duration,
    pub roulette_penalty: Duration,
    pub roulette_cooldown: std::time::Duration,
}

impl Default for PitConfig {
    fn default() -> Self {
        Self {
            horizon: Duration::days(30),
            curve: PenaltyCurve::default(),
            sweep_interval: std::time::Duration::from_secs(60),
            max_timeout: Duration::hours(14 * 24),
            roulette_penalty: Duration::minutes(30),
            roulette_cooldown: std::time::Duration::from_secs(60),
        }
    }
}

impl PitConfig {
    /// Reads `PIT_*` environment variables on top of the defaults.
    pub fn from_env() -> PitResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PitConfig::from_env`] with an arbitrary key lookup.
    ///
    /// Tables are JSON arrays of five numbers, one per severity level, e.g.
    /// `PIT_STRIKE_HOURS=[4,8,12,24,48]`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PitResult<Self> {
        let mut config = Self::default();

        if let Some(days) = parse_number(&lookup, "PIT_HORIZON_DAYS", MAX_HOURS / 24.0)? {
            config.horizon = hours(days * 24.0);
        }
        if let Some(table) = parse_table(&lookup, "PIT_STRIKE_HOURS", MAX_HOURS)? {
            config.curve.base = table.map(hours);
        }
        if let Some(table) = parse_table(&lookup, "PIT_REPEAT_HOURS", MAX_HOURS)? {
            config.curve.repeat = table.map(hours);
        }
        if let Some(table) = parse_table(&lookup, "PIT_ESCALATION", MAX_ESCALATION)? {
            config.curve.escalation = table;
        }
        if let Some(secs) = parse_number(&lookup, "PIT_SWEEP_SECONDS", MAX_SECONDS)? {
            if secs < 1.0 {
                return Err(ModerationError::Config(
                    "PIT_SWEEP_SECONDS must be at least 1".to_string(),
                ));
            }
            config.sweep_interval = std::time::Duration::from_secs_f64(secs);
        }
        if let Some(h) = parse_number(&lookup, "PIT_MAX_TIMEOUT_HOURS", MAX_HOURS)? {
            config.max_timeout = hours(h);
        }
        if let Some(minutes) = parse_number(&lookup, "PIT_ROULETTE_MINUTES", MAX_HOURS * 60.0)? {
            config.roulette_penalty = hours(minutes / 60.0);
        }
        if let Some(secs) = parse_number(&lookup, "PIT_ROULETTE_COOLDOWN_SECONDS", MAX_SECONDS)? {
            config.roulette_cooldown = std::time::Duration::from_secs_f64(secs);
        }

        Ok(config)
    }
}

/// Converts fractional hours to a millisecond-precise duration.
pub fn hours(value: f64) -> Duration {
    Duration::milliseconds((value * MS_PER_HOUR).round() as i64)
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    max: f64,
) -> PitResult<Option<f64>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ModerationError::Config(format!("{key} is not a number: {raw}")))?;
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(ModerationError::Config(format!(
            "{key} must be a number between 0 and {max}"
        )));
    }
    Ok(Some(value))
}

fn parse_table(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    max: f64,
) -> PitResult<Option<[f64; SEVERITY_LEVELS]>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let table: [f64; SEVERITY_LEVELS] = serde_json::from_str(&raw).map_err(|e| {
        ModerationError::Config(format!(
            "{key} must be a JSON array of {SEVERITY_LEVELS} numbers: {e}"
        ))
    })?;
    if table.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > max) {
        return Err(ModerationError::Config(format!(
            "{key} entries must be between 0 and {max}"
        )));
    }
    Ok(Some(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = PitConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.horizon, Duration::days(30));
        assert_eq!(config.curve.base[2], Duration::hours(12));
        assert_eq!(config.curve.repeat[2], Duration::hours(9));
        assert_eq!(config.curve.escalation[1], 1.05);
        assert_eq!(config.sweep_interval, std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = PitConfig::from_lookup(lookup(&[
            ("PIT_HORIZON_DAYS", "7"),
            ("PIT_STRIKE_HOURS", "[1, 2, 3, 4, 5.5]"),
            ("PIT_ESCALATION", "[1, 2, 3, 4, 5]"),
            ("PIT_SWEEP_SECONDS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.horizon, Duration::days(7));
        assert_eq!(config.curve.base[4], Duration::minutes(330));
        assert_eq!(config.curve.escalation[4], 5.0);
        assert_eq!(config.sweep_interval, std::time::Duration::from_secs(15));
    }

    #[test]
    fn test_rejects_malformed_values() {
        assert!(PitConfig::from_lookup(lookup(&[("PIT_STRIKE_HOURS", "[1, 2]")])).is_err());
        assert!(PitConfig::from_lookup(lookup(&[("PIT_HORIZON_DAYS", "soon")])).is_err());
        assert!(PitConfig::from_lookup(lookup(&[("PIT_REPEAT_HOURS", "[1, 2, 3, 4, -5]")])).is_err());
        assert!(PitConfig::from_lookup(lookup(&[("PIT_SWEEP_SECONDS", "0")])).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_durations() {
        assert!(PitConfig::from_lookup(lookup(&[("PIT_HORIZON_DAYS", "1e300")])).is_err());
        assert!(PitConfig::from_lookup(lookup(&[("PIT_STRIKE_HOURS", "[1, 2, 3, 4, 1e18]")])).is_err());
        assert!(PitConfig::from_lookup(lookup(&[("PIT_ESCALATION", "[1, 1, 1, 1, 1000]")])).is_err());
        assert!(PitConfig::from_lookup(lookup(&[("PIT_SWEEP_SECONDS", "1e20")])).is_err());

        let widest = PitConfig::from_lookup(lookup(&[
            ("PIT_HORIZON_DAYS", "3650"),
            ("PIT_STRIKE_HOURS", "[87600, 87600, 87600, 87600, 87600]"),
            ("PIT_REPEAT_HOURS", "[87600, 87600, 87600, 87600, 87600]"),
            ("PIT_ESCALATION", "[100, 100, 100, 100, 100]"),
        ]))
        .unwrap();
        assert_eq!(widest.horizon, Duration::days(3650));
    }
}
