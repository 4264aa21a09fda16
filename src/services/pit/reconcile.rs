use super::ledger::LedgerEntry;
use super::report::StatusReport;
use chrono::{DateTime, Utc};

/// Where the authoritative suspension comes from.
///
/// Declaration order doubles as the tie-break when two sources release at the
/// exact same instant: the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PitSource {
    Strike,
    TimedPenalty,
    MinigamePenalty,
    Release,
}

/// The single authoritative suspension state of a user at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Pit {
    pub source: PitSource,
    /// Ledger row that determined the state: the newest counted strike, the
    /// penalty row, or the release row.
    pub entry_id: i32,
    pub active: bool,
    pub release_time: DateTime<Utc>,
    pub reason: Option<String>,
}

impl StatusReport {
    /// Picks the suspension source that expires last among everything recorded
    /// after the last release. `None` when the user has no suspension history.
    pub fn current_pit(&self) -> Option<Pit> {
        let floor = self.last_release_time();
        let now = self.generated_at;

        let strikes = self.counted_strikes();
        let from_strikes = self
            .curve
            .release_time(strikes)
            .zip(strikes.first())
            .map(|(release_time, newest)| candidate(PitSource::Strike, newest, release_time));

        let mut best: Option<Pit> = None;
        let candidates = from_strikes
            .into_iter()
            .chain(penalty_candidates(
                PitSource::TimedPenalty,
                &self.timed_penalties,
                floor,
            ))
            .chain(penalty_candidates(
                PitSource::MinigamePenalty,
                &self.minigame_penalties,
                floor,
            ));

        for pit in candidates {
            // Strictly later only, so earlier sources keep ties
            if best
                .as_ref()
                .is_none_or(|current| pit.release_time > current.release_time)
            {
                best = Some(pit);
            }
        }

        match best {
            Some(mut pit) => {
                pit.active = pit.release_time > now;
                Some(pit)
            }
            None => self.releases.first().map(|release| Pit {
                source: PitSource::Release,
                entry_id: release.id,
                active: false,
                release_time: release.timestamp,
                reason: release.comment.clone(),
            }),
        }
    }

    pub fn is_pitted(&self) -> bool {
        self.current_pit().is_some_and(|pit| pit.active)
    }
}

fn penalty_candidates(
    source: PitSource,
    rows: &[LedgerEntry],
    floor: DateTime<Utc>,
) -> impl Iterator<Item = Pit> + '_ {
    rows.iter()
        .filter(move |row| row.timestamp > floor)
        .filter_map(move |row| row.ends_at().map(|end| candidate(source, row, end)))
}

fn candidate(source: PitSource, row: &LedgerEntry, release_time: DateTime<Utc>) -> Pit {
    Pit {
        source,
        entry_id: row.id,
        active: false,
        release_time,
        reason: row.comment.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pit::config::PitConfig;
    use crate::services::pit::ledger::{EntryKind, RELEASE_SEVERITY};
    use chrono::{Duration, TimeZone};

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()
    }

    fn entry(
        id: i32,
        kind: EntryKind,
        severity: i32,
        at: DateTime<Utc>,
        duration: Option<Duration>,
    ) -> LedgerEntry {
        LedgerEntry {
            id,
            user_id: 9,
            moderator_id: None,
            kind,
            severity,
            comment: Some(format!("row {id}")),
            timestamp: at,
            duration,
            expired: false,
        }
    }

    fn report(ledger: Vec<LedgerEntry>, now: DateTime<Utc>) -> StatusReport {
        StatusReport::build(9, ledger, now, &PitConfig::default())
    }

    #[test]
    fn test_no_history_means_no_pit() {
        assert_eq!(report(vec![], t()).current_pit(), None);
    }

    #[test]
    fn test_strike_outlasting_minigame_penalty_wins() {
        // Severity 1 base is 4h; shift the strike so it releases at T+10h
        let strike = entry(1, EntryKind::Strike, 1, t() + Duration::hours(6), None);
        let game = entry(
            2,
            EntryKind::MinigamePenalty,
            0,
            t(),
            Some(Duration::hours(2)),
        );

        let pit = report(vec![strike, game], t() + Duration::hours(1))
            .current_pit()
            .unwrap();

        assert_eq!(pit.source, PitSource::Strike);
        assert_eq!(pit.release_time, t() + Duration::hours(10));
        assert!(pit.active);
        assert_eq!(pit.reason.as_deref(), Some("row 1"));
    }

    #[test]
    fn test_longer_timeout_overrides_strike() {
        let strike = entry(1, EntryKind::Strike, 1, t(), None);
        let timeout = entry(1, EntryKind::TimedPenalty, 0, t(), Some(Duration::hours(24)));

        let pit = report(vec![strike, timeout], t()).current_pit().unwrap();

        assert_eq!(pit.source, PitSource::TimedPenalty);
        assert_eq!(pit.release_time, t() + Duration::hours(24));
    }

    #[test]
    fn test_equal_release_times_prefer_strike() {
        let strike = entry(1, EntryKind::Strike, 1, t(), None);
        let timeout = entry(1, EntryKind::TimedPenalty, 0, t(), Some(Duration::hours(4)));
        let game = entry(1, EntryKind::MinigamePenalty, 0, t(), Some(Duration::hours(4)));

        let pit = report(vec![game, timeout, strike], t()).current_pit().unwrap();
        assert_eq!(pit.source, PitSource::Strike);

        let timeout = entry(1, EntryKind::TimedPenalty, 0, t(), Some(Duration::hours(4)));
        let game = entry(1, EntryKind::MinigamePenalty, 0, t(), Some(Duration::hours(4)));
        let pit = report(vec![game, timeout], t()).current_pit().unwrap();
        assert_eq!(pit.source, PitSource::TimedPenalty);
    }

    #[test]
    fn test_release_clears_earlier_sources() {
        let strike = entry(1, EntryKind::Strike, 5, t(), None);
        let release = entry(2, EntryKind::Release, RELEASE_SEVERITY, t() + Duration::hours(1), None);

        let pit = report(vec![strike, release], t() + Duration::hours(2))
            .current_pit()
            .unwrap();

        assert_eq!(pit.source, PitSource::Release);
        assert_eq!(pit.entry_id, 2);
        assert!(!pit.active);
        assert_eq!(pit.release_time, t() + Duration::hours(1));
    }

    #[test]
    fn test_strike_after_release_counts_again() {
        let release = entry(1, EntryKind::Release, RELEASE_SEVERITY, t(), None);
        let strike = entry(2, EntryKind::Strike, 2, t() + Duration::minutes(5), None);

        let pit = report(vec![release, strike], t() + Duration::hours(1))
            .current_pit()
            .unwrap();

        assert_eq!(pit.source, PitSource::Strike);
        assert_eq!(pit.release_time, t() + Duration::minutes(5) + Duration::hours(8));
        assert!(pit.active);
    }

    #[test]
    fn test_elapsed_timeout_is_reported_inactive() {
        let timeout = entry(1, EntryKind::TimedPenalty, 0, t(), Some(Duration::hours(1)));

        let pit = report(vec![timeout], t() + Duration::hours(3))
            .current_pit()
            .unwrap();

        assert_eq!(pit.source, PitSource::TimedPenalty);
        assert!(!pit.active);
    }

    #[test]
    fn test_current_pit_is_deterministic() {
        let ledger = vec![
            entry(1, EntryKind::Strike, 3, t(), None),
            entry(2, EntryKind::Strike, 3, t() + Duration::days(2), None),
            entry(1, EntryKind::TimedPenalty, 0, t() + Duration::days(1), Some(Duration::hours(3))),
        ];
        let report = report(ledger, t() + Duration::days(2) + Duration::hours(1));

        assert_eq!(report.current_pit(), report.current_pit());
        assert_eq!(
            report.current_pit().unwrap().release_time,
            t() + Duration::days(2) + Duration::milliseconds(79_380_000)
        );
    }
}
