use super::config::PitConfig;
use super::ledger::{EntryKind, LedgerEntry};
use super::penalty::PenaltyCurve;
use chrono::{DateTime, Duration, Utc};

/// A user's ledger classified at one point in time.
///
/// Always rebuilt from the full ledger; never patched incrementally, so edits
/// that shrink a decay chain take effect on the next build.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub user_id: u64,
    pub generated_at: DateTime<Utc>,
    /// Newest first, like every list below.
    pub active_strikes: Vec<LedgerEntry>,
    pub expired_strikes: Vec<LedgerEntry>,
    pub removed_strikes: Vec<LedgerEntry>,
    pub releases: Vec<LedgerEntry>,
    pub timed_penalties: Vec<LedgerEntry>,
    pub minigame_penalties: Vec<LedgerEntry>,
    pub warnings: Vec<LedgerEntry>,
    /// Decay window the report was classified with.
    pub horizon: Duration,
    pub(crate) curve: PenaltyCurve,
}

impl StatusReport {
    pub fn build(
        user_id: u64,
        mut ledger: Vec<LedgerEntry>,
        now: DateTime<Utc>,
        config: &PitConfig,
    ) -> Self {
        ledger.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let mut report = Self {
            user_id,
            generated_at: now,
            active_strikes: Vec::new(),
            expired_strikes: Vec::new(),
            removed_strikes: Vec::new(),
            releases: Vec::new(),
            timed_penalties: Vec::new(),
            minigame_penalties: Vec::new(),
            warnings: Vec::new(),
            horizon: config.horizon,
            curve: config.curve.clone(),
        };

        let cutoff = now - config.horizon;
        // Timestamp of the most recently accepted active strike
        let mut chain: Option<DateTime<Utc>> = None;

        for entry in ledger {
            match entry.kind {
                EntryKind::Warning => report.warnings.push(entry),
                EntryKind::TimedPenalty => report.timed_penalties.push(entry),
                EntryKind::MinigamePenalty => report.minigame_penalties.push(entry),
                EntryKind::Strike | EntryKind::Release => {
                    if entry.is_release() {
                        report.releases.push(entry);
                    } else if entry.is_removed() {
                        report.removed_strikes.push(entry);
                    } else {
                        let chained =
                            chain.is_some_and(|newer| entry.timestamp > newer - config.horizon);
                        if entry.timestamp > cutoff || chained {
                            chain = Some(entry.timestamp);
                            report.active_strikes.push(entry);
                        } else {
                            report.expired_strikes.push(entry);
                        }
                    }
                }
            }
        }

        report
    }

    /// Timestamp of the newest explicit release, or the Unix epoch. Nothing at
    /// or before this instant counts towards the current pit.
    pub fn last_release_time(&self) -> DateTime<Utc> {
        self.releases
            .first()
            .map_or(DateTime::UNIX_EPOCH, |release| release.timestamp)
    }

    /// Expired strikes whose expiry has not been recorded yet.
    pub fn newly_expired(&self) -> Vec<&LedgerEntry> {
        self.expired_strikes
            .iter()
            .filter(|strike| !strike.expired)
            .collect()
    }

    /// Active strikes newer than the last release.
    pub fn counted_strikes(&self) -> &[LedgerEntry] {
        let floor = self.last_release_time();
        let end = self
            .active_strikes
            .iter()
            .position(|strike| strike.timestamp <= floor)
            .unwrap_or(self.active_strikes.len());
        &self.active_strikes[..end]
    }

    pub fn is_empty(&self) -> bool {
        self.active_strikes.is_empty()
            && self.expired_strikes.is_empty()
            && self.removed_strikes.is_empty()
            && self.releases.is_empty()
            && self.timed_penalties.is_empty()
            && self.minigame_penalties.is_empty()
            && self.warnings.is_empty()
    }
}
