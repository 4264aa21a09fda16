use super::ledger::{LedgerEntry, MAX_SEVERITY, MIN_SEVERITY};
use chrono::{DateTime, Duration, Utc};

pub const SEVERITY_LEVELS: usize = MAX_SEVERITY as usize;

/// Escalating, severity-weighted penalty curve.
///
/// The newest active strike contributes its `base` duration, every older active
/// strike its `repeat` increment, and the sum is multiplied by the escalation
/// factor for the number of active strikes (capped at the last entry).
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyCurve {
    pub base: [Duration; SEVERITY_LEVELS],
    pub repeat: [Duration; SEVERITY_LEVELS],
    pub escalation: [f64; SEVERITY_LEVELS],
}

impl Default for PenaltyCurve {
    fn default() -> Self {
        Self {
            base: [4, 8, 12, 24, 48].map(Duration::hours),
            repeat: [1, 4, 9, 24, 48].map(Duration::hours),
            escalation: [1.0, 1.05, 1.1, 1.3, 3.0],
        }
    }
}

impl PenaltyCurve {
    /// Suspension length for a set of active strikes ordered newest first.
    pub fn duration(&self, active: &[LedgerEntry]) -> Duration {
        let Some((newest, older)) = active.split_first() else {
            return Duration::zero();
        };

        let total = older
            .iter()
            .fold(self.base[level(newest.severity)], |acc, strike| {
                acc + self.repeat[level(strike.severity)]
            });

        let factor = self.escalation[active.len().min(SEVERITY_LEVELS) - 1];
        Duration::milliseconds((total.num_milliseconds() as f64 * factor).round() as i64)
    }

    /// Newest active strike plus [`PenaltyCurve::duration`], `None` without strikes.
    pub fn release_time(&self, active: &[LedgerEntry]) -> Option<DateTime<Utc>> {
        active
            .first()
            .map(|newest| newest.timestamp + self.duration(active))
    }
}

fn level(severity: i32) -> usize {
    (severity.clamp(MIN_SEVERITY, MAX_SEVERITY) - MIN_SEVERITY) as usize
}
