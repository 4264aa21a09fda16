//! The pit: strike ledger, suspension status engine and pit-role synchronization.

pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod ledger;
pub mod penalty;
pub mod reconcile;
pub mod report;
pub mod runner;
pub mod store;
pub mod sync;
#[cfg(test)]
pub mod testing;

pub use config::PitConfig;
pub use error::{ModerationError, PitResult};
pub use ledger::{EntryKind, LedgerEntry, LedgerStore, NewEntry};
pub use reconcile::{Pit, PitSource};
pub use report::StatusReport;
pub use sync::{Notice, Notifier, SuspensionFlag, SyncOutcome, Synchronizer};

use chrono::{DateTime, Duration, Utc};
use ledger::{MAX_SEVERITY, MIN_SEVERITY, REMOVED_SEVERITY};
use std::sync::Arc;
use tracing::{info, warn};

/// What an operation did, carried in results and log-channel notices.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationAction {
    Strike { strike_id: Option<i32>, severity: i32 },
    Release { amended_strike: Option<i32> },
    RemoveStrike { strike_id: i32 },
    EditComment { strike_id: i32 },
    EditSeverity { strike_id: i32, from: i32, to: i32 },
    Warn,
    SelfTimeout { duration: Duration },
    ManualTimeout { duration: Duration },
    MinigamePenalty { duration: Duration },
    ListStrikes,
    ListWarnings,
    Status,
}

impl ModerationAction {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ListStrikes | Self::ListWarnings | Self::Status)
    }
}

/// Every operation the command surface can ask of the pit.
#[derive(Debug, Clone, PartialEq)]
pub enum PitCommand {
    Strike {
        user_id: u64,
        moderator_id: u64,
        severity: i32,
        comment: Option<String>,
    },
    Release {
        user_id: u64,
        moderator_id: u64,
        amend: bool,
        comment: Option<String>,
    },
    RemoveStrike {
        strike_id: i32,
        moderator_id: u64,
    },
    EditComment {
        strike_id: i32,
        moderator_id: u64,
        comment: String,
    },
    EditSeverity {
        strike_id: i32,
        moderator_id: u64,
        severity: i32,
    },
    ListStrikes {
        user_id: u64,
    },
    Warn {
        user_id: u64,
        moderator_id: u64,
        comment: String,
    },
    ListWarnings {
        user_id: u64,
    },
    Status {
        user_id: u64,
    },
    SelfTimeout {
        user_id: u64,
        hours: f64,
    },
    ManualTimeout {
        user_id: u64,
        moderator_id: u64,
        hours: f64,
        comment: Option<String>,
    },
    MinigamePenalty {
        user_id: u64,
        duration: Duration,
        comment: Option<String>,
    },
}

/// Outcome of a pit operation, handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct ModerationResult {
    pub user_id: u64,
    pub action: ModerationAction,
    /// `false` when nothing was written, e.g. a duplicate event hit the
    /// timestamp constraint.
    pub inserted: bool,
    pub report: StatusReport,
    pub pit: Option<Pit>,
    /// `None` for read-only operations.
    pub sync: Option<SyncOutcome>,
    /// Set when the pit role could not be updated; the ledger change stands.
    pub flag_error: Option<String>,
}

/// Context object for the pit engine: ledger store, synchronizer and config.
pub struct PitService {
    store: Arc<dyn LedgerStore>,
    sync: Synchronizer,
    config: PitConfig,
    sweeping: tokio::sync::Mutex<()>,
}

impl PitService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        flag: Arc<dyn SuspensionFlag>,
        notifier: Arc<dyn Notifier>,
        config: PitConfig,
    ) -> Self {
        Self {
            store,
            sync: Synchronizer::new(flag, notifier),
            config,
            sweeping: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PitConfig {
        &self.config
    }

    /// Loads the full ledger and classifies it as of `now`.
    pub async fn report(&self, user_id: u64, now: DateTime<Utc>) -> PitResult<StatusReport> {
        let ledger = self.store.all(user_id).await?;
        Ok(StatusReport::build(user_id, ledger, now, &self.config))
    }

    /// Dispatches a command. `at` is the time of the triggering event and
    /// becomes the ledger timestamp of anything appended.
    pub async fn execute(&self, command: PitCommand, at: DateTime<Utc>) -> PitResult<ModerationResult> {
        match command {
            PitCommand::Strike {
                user_id,
                moderator_id,
                severity,
                comment,
            } => self.strike(user_id, moderator_id, severity, comment, at).await,
            PitCommand::Release {
                user_id,
                moderator_id,
                amend,
                comment,
            } => self.release(user_id, moderator_id, amend, comment, at).await,
            PitCommand::RemoveStrike {
                strike_id,
                moderator_id,
            } => self.remove_strike(strike_id, moderator_id, at).await,
            PitCommand::EditComment {
                strike_id,
                moderator_id,
                comment,
            } => self.edit_comment(strike_id, moderator_id, comment, at).await,
            PitCommand::EditSeverity {
                strike_id,
                moderator_id,
                severity,
            } => self.edit_severity(strike_id, moderator_id, severity, at).await,
            PitCommand::ListStrikes { user_id } => self.list_strikes(user_id, at).await,
            PitCommand::Warn {
                user_id,
                moderator_id,
                comment,
            } => self.warn(user_id, moderator_id, comment, at).await,
            PitCommand::ListWarnings { user_id } => self.list_warnings(user_id, at).await,
            PitCommand::Status { user_id } => self.status(user_id, at).await,
            PitCommand::SelfTimeout { user_id, hours } => {
                self.self_timeout(user_id, hours, at).await
            }
            PitCommand::ManualTimeout {
                user_id,
                moderator_id,
                hours,
                comment,
            } => {
                self.manual_timeout(user_id, moderator_id, hours, comment, at)
                    .await
            }
            PitCommand::MinigamePenalty {
                user_id,
                duration,
                comment,
            } => self.minigame_penalty(user_id, duration, comment, at).await,
        }
    }

    pub async fn strike(
        &self,
        user_id: u64,
        moderator_id: u64,
        severity: i32,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        check_severity(severity)?;
        let comment = clean(comment);
        let reason = comment.clone().unwrap_or_else(|| "Strike".to_string());

        let strike_id = self
            .store
            .append(NewEntry::strike(user_id, moderator_id, severity, comment, at))
            .await?;

        self.finish(
            user_id,
            Some(moderator_id),
            ModerationAction::Strike {
                strike_id,
                severity,
            },
            strike_id.is_some(),
            at,
            Some(&reason),
        )
        .await
    }

    /// Ends the current pit. With `amend`, the newest strike still counting is also
    /// struck from the record, for strikes issued by mistake.
    pub async fn release(
        &self,
        user_id: u64,
        moderator_id: u64,
        amend: bool,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        let comment = clean(comment);
        let reason = comment.clone().unwrap_or_else(|| "Released".to_string());

        // Picked before the release lands, since the release closes the period
        let amend_target = if amend {
            let report = self.report(user_id, at).await?;
            report.counted_strikes().first().map(|newest| newest.id)
        } else {
            None
        };

        let inserted = self
            .store
            .append(NewEntry::release(user_id, moderator_id, comment, at))
            .await?
            .is_some();

        let mut amended_strike = None;
        if let Some(strike_id) = amend_target.filter(|_| inserted) {
            self.store
                .update_severity(strike_id, REMOVED_SEVERITY)
                .await?;
            amended_strike = Some(strike_id);
        }

        self.finish(
            user_id,
            Some(moderator_id),
            ModerationAction::Release { amended_strike },
            inserted,
            at,
            Some(&reason),
        )
        .await
    }

    pub async fn remove_strike(
        &self,
        strike_id: i32,
        moderator_id: u64,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        let strike = self.find_strike(strike_id).await?;
        let changed = !strike.is_removed();
        if changed {
            self.store
                .update_severity(strike_id, REMOVED_SEVERITY)
                .await?;
        }

        self.finish(
            strike.user_id,
            Some(moderator_id),
            ModerationAction::RemoveStrike { strike_id },
            changed,
            at,
            Some("Strike removed"),
        )
        .await
    }

    pub async fn edit_comment(
        &self,
        strike_id: i32,
        moderator_id: u64,
        comment: String,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        let entry = self
            .store
            .get(strike_id)
            .await?
            .ok_or_else(|| ModerationError::NotFound(format!("strike #{strike_id}")))?;

        if !self
            .store
            .update_comment(strike_id, clean(Some(comment)))
            .await?
        {
            return Err(ModerationError::NotFound(format!("strike #{strike_id}")));
        }

        self.finish(
            entry.user_id,
            Some(moderator_id),
            ModerationAction::EditComment { strike_id },
            true,
            at,
            None,
        )
        .await
    }

    pub async fn edit_severity(
        &self,
        strike_id: i32,
        moderator_id: u64,
        severity: i32,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        check_severity(severity)?;
        let strike = self.find_strike(strike_id).await?;
        let changed = strike.severity != severity;
        if changed {
            self.store.update_severity(strike_id, severity).await?;
        }

        self.finish(
            strike.user_id,
            Some(moderator_id),
            ModerationAction::EditSeverity {
                strike_id,
                from: strike.severity,
                to: severity,
            },
            changed,
            at,
            Some("Strike severity changed"),
        )
        .await
    }

    /// Records a warning. Warnings never affect the pit.
    pub async fn warn(
        &self,
        user_id: u64,
        moderator_id: u64,
        comment: String,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        let Some(comment) = clean(Some(comment)) else {
            return Err(ModerationError::Validation(
                "a warning needs a comment".to_string(),
            ));
        };

        let inserted = self
            .store
            .append(NewEntry::warning(user_id, moderator_id, comment, at))
            .await?
            .is_some();

        self.finish(
            user_id,
            Some(moderator_id),
            ModerationAction::Warn,
            inserted,
            at,
            None,
        )
        .await
    }

    /// A user putting themselves in the pit. No DM is sent for it.
    pub async fn self_timeout(
        &self,
        user_id: u64,
        hours: f64,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        let duration = self.timeout_duration(hours)?;

        let inserted = self
            .store
            .append(NewEntry::timed_penalty(user_id, None, duration, None, at))
            .await?
            .is_some();

        self.finish(
            user_id,
            None,
            ModerationAction::SelfTimeout { duration },
            inserted,
            at,
            None,
        )
        .await
    }

    pub async fn manual_timeout(
        &self,
        user_id: u64,
        moderator_id: u64,
        hours: f64,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        let duration = self.timeout_duration(hours)?;
        let comment = clean(comment);
        let reason = comment.clone().unwrap_or_else(|| "Timeout".to_string());

        let inserted = self
            .store
            .append(NewEntry::timed_penalty(
                user_id,
                Some(moderator_id),
                duration,
                comment,
                at,
            ))
            .await?
            .is_some();

        self.finish(
            user_id,
            Some(moderator_id),
            ModerationAction::ManualTimeout { duration },
            inserted,
            at,
            Some(&reason),
        )
        .await
    }

    /// Automatic penalty handed out by a minigame.
    pub async fn minigame_penalty(
        &self,
        user_id: u64,
        duration: Duration,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        if duration <= Duration::zero() {
            return Err(ModerationError::Validation(
                "penalty duration must be positive".to_string(),
            ));
        }
        let comment = clean(comment);
        let reason = comment.clone().unwrap_or_else(|| "Minigame".to_string());

        let inserted = self
            .store
            .append(NewEntry::minigame_penalty(user_id, duration, comment, at))
            .await?
            .is_some();

        self.finish(
            user_id,
            None,
            ModerationAction::MinigamePenalty { duration },
            inserted,
            at,
            Some(&reason),
        )
        .await
    }

    pub async fn list_strikes(&self, user_id: u64, now: DateTime<Utc>) -> PitResult<ModerationResult> {
        self.read_only(user_id, ModerationAction::ListStrikes, now).await
    }

    pub async fn list_warnings(&self, user_id: u64, now: DateTime<Utc>) -> PitResult<ModerationResult> {
        self.read_only(user_id, ModerationAction::ListWarnings, now).await
    }

    pub async fn status(&self, user_id: u64, now: DateTime<Utc>) -> PitResult<ModerationResult> {
        self.read_only(user_id, ModerationAction::Status, now).await
    }

    /// Recomputes the pit and reconciles the role. A `reason` makes transitions
    /// notify the user.
    pub async fn resync(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
        reason: Option<&str>,
    ) -> PitResult<SyncOutcome> {
        let report = self.report(user_id, now).await?;
        self.sync
            .sync(user_id, report.current_pit().as_ref(), reason)
            .await
    }

    /// Strikes that crossed their horizon since the last call. Their expiry is
    /// persisted, so each is returned exactly once.
    pub async fn take_newly_expired(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> PitResult<Vec<LedgerEntry>> {
        let report = self.report(user_id, now).await?;
        self.record_expiries(&report).await
    }

    async fn record_expiries(&self, report: &StatusReport) -> PitResult<Vec<LedgerEntry>> {
        let expired: Vec<LedgerEntry> = report.newly_expired().into_iter().cloned().collect();
        if !expired.is_empty() {
            let ids: Vec<i32> = expired.iter().map(|strike| strike.id).collect();
            self.store.mark_expired(&ids).await?;
            info!(
                "Recorded expiry of {} strike(s) for user {}",
                ids.len(),
                report.user_id
            );
        }
        Ok(expired)
    }

    async fn read_only(
        &self,
        user_id: u64,
        action: ModerationAction,
        now: DateTime<Utc>,
    ) -> PitResult<ModerationResult> {
        let report = self.report(user_id, now).await?;
        Ok(ModerationResult {
            user_id,
            action,
            inserted: false,
            pit: report.current_pit(),
            report,
            sync: None,
            flag_error: None,
        })
    }

    /// Reloads the ledger after a mutation, reconciles the role and writes the
    /// action to the log channel.
    async fn finish(
        &self,
        user_id: u64,
        moderator_id: Option<u64>,
        action: ModerationAction,
        changed: bool,
        at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> PitResult<ModerationResult> {
        let report = self.report(user_id, at).await?;
        let pit = report.current_pit();

        let (sync, flag_error) = match self.sync.sync(user_id, pit.as_ref(), reason).await {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (None, Some(e.to_string())),
        };

        if changed {
            info!("Pit action {:?} on user {}", action, user_id);
            self.sync
                .log(&Notice::Action {
                    user_id,
                    moderator_id,
                    action: action.clone(),
                    pit: pit.clone(),
                })
                .await;
        } else {
            warn!(
                "Pit action {:?} on user {} changed nothing (duplicate event?)",
                action, user_id
            );
        }

        Ok(ModerationResult {
            user_id,
            action,
            inserted: changed,
            report,
            pit,
            sync,
            flag_error,
        })
    }

    async fn find_strike(&self, strike_id: i32) -> PitResult<LedgerEntry> {
        self.store
            .get(strike_id)
            .await?
            .filter(|entry| entry.kind == EntryKind::Strike)
            .ok_or_else(|| ModerationError::NotFound(format!("strike #{strike_id}")))
    }

    fn timeout_duration(&self, hours: f64) -> PitResult<Duration> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(ModerationError::Validation(
                "duration must be a positive number of hours".to_string(),
            ));
        }
        let duration = config::hours(hours);
        if duration <= Duration::zero() {
            return Err(ModerationError::Validation(
                "duration is too short".to_string(),
            ));
        }
        if duration > self.config.max_timeout {
            return Err(ModerationError::Validation(format!(
                "duration may not exceed {} hours",
                self.config.max_timeout.num_hours()
            )));
        }
        Ok(duration)
    }
}

fn check_severity(severity: i32) -> PitResult<()> {
    if (MIN_SEVERITY..=MAX_SEVERITY).contains(&severity) {
        Ok(())
    } else {
        Err(ModerationError::Validation(format!(
            "severity must be between {MIN_SEVERITY} and {MAX_SEVERITY}"
        )))
    }
}

fn clean(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use super::testing::{MemoryLedgerStore, RecordingFlag, RecordingNotifier};

    struct Harness {
        service: PitService,
        store: Arc<MemoryLedgerStore>,
        flag: Arc<RecordingFlag>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryLedgerStore::default());
        let flag = Arc::new(RecordingFlag::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = PitService::new(
            store.clone(),
            flag.clone(),
            notifier.clone(),
            PitConfig::default(),
        );
        Harness {
            service,
            store,
            flag,
            notifier,
        }
    }

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap()
    }

    const USER: u64 = 100;
    const MOD: u64 = 1;

    #[tokio::test]
    async fn test_strike_pits_user_and_notifies_once() {
        let h = harness();

        let result = h
            .service
            .strike(USER, MOD, 3, Some(" spamming ".to_string()), t())
            .await
            .unwrap();

        assert!(result.inserted);
        assert_eq!(result.sync, Some(SyncOutcome::Flagged));
        let pit = result.pit.unwrap();
        assert!(pit.active);
        assert_eq!(pit.release_time, t() + Duration::hours(12));
        assert_eq!(pit.reason.as_deref(), Some("spamming"));
        assert!(h.flag.contains(USER));
        assert_eq!(h.notifier.dms().len(), 1);
        assert_eq!(h.notifier.logs().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_event_is_ignored() {
        let h = harness();

        h.service.strike(USER, MOD, 2, None, t()).await.unwrap();
        let again = h.service.strike(USER, MOD, 2, None, t()).await.unwrap();

        assert!(!again.inserted);
        assert_eq!(again.sync, Some(SyncOutcome::Unchanged));
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.flag.mutations(), 1);
        assert_eq!(h.notifier.dms().len(), 1);
    }

    #[tokio::test]
    async fn test_second_strike_escalates() {
        let h = harness();
        let later = t() + Duration::days(3);

        h.service.strike(USER, MOD, 3, None, t()).await.unwrap();
        let result = h.service.strike(USER, MOD, 3, None, later).await.unwrap();

        assert_eq!(
            result.pit.unwrap().release_time,
            later + Duration::milliseconds(79_380_000)
        );
        assert_eq!(result.report.active_strikes.len(), 2);
    }

    #[tokio::test]
    async fn test_release_lifts_pit() {
        let h = harness();
        h.service.strike(USER, MOD, 5, None, t()).await.unwrap();

        let result = h
            .service
            .release(USER, MOD, false, None, t() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(result.sync, Some(SyncOutcome::Unflagged));
        let pit = result.pit.unwrap();
        assert_eq!(pit.source, PitSource::Release);
        assert!(!pit.active);
        assert!(!h.flag.contains(USER));
        assert_eq!(result.report.last_release_time(), t() + Duration::hours(1));
        // Strike is still on record, just no longer counted
        assert_eq!(result.report.active_strikes.len(), 1);
    }

    #[tokio::test]
    async fn test_amended_release_removes_newest_strike() {
        let h = harness();
        h.service.strike(USER, MOD, 1, None, t()).await.unwrap();
        h.service
            .strike(USER, MOD, 4, None, t() + Duration::hours(1))
            .await
            .unwrap();

        let result = h
            .service
            .release(USER, MOD, true, None, t() + Duration::hours(2))
            .await
            .unwrap();

        assert_eq!(
            result.action,
            ModerationAction::Release {
                amended_strike: Some(2)
            }
        );
        assert_eq!(result.report.removed_strikes.len(), 1);
        assert_eq!(result.report.removed_strikes[0].severity, REMOVED_SEVERITY);
        assert_eq!(result.report.active_strikes.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_amended_release_removes_one_strike() {
        let h = harness();
        let at = t() + Duration::hours(2);
        h.service.strike(USER, MOD, 2, None, t()).await.unwrap();
        h.service
            .strike(USER, MOD, 3, None, t() + Duration::hours(1))
            .await
            .unwrap();

        h.service.release(USER, MOD, true, None, at).await.unwrap();
        let logs = h.notifier.logs().len();
        let again = h.service.release(USER, MOD, true, None, at).await.unwrap();

        assert!(!again.inserted);
        assert_eq!(again.action, ModerationAction::Release { amended_strike: None });
        assert_eq!(again.report.removed_strikes.len(), 1);
        assert_eq!(again.report.active_strikes.len(), 1);
        assert_eq!(h.notifier.logs().len(), logs);
    }

    #[tokio::test]
    async fn test_amended_release_leaves_closed_period_alone() {
        let h = harness();
        h.service.strike(USER, MOD, 2, None, t()).await.unwrap();
        h.service
            .release(USER, MOD, false, None, t() + Duration::hours(1))
            .await
            .unwrap();

        let result = h
            .service
            .release(USER, MOD, true, None, t() + Duration::hours(2))
            .await
            .unwrap();

        assert_eq!(result.action, ModerationAction::Release { amended_strike: None });
        assert!(result.report.removed_strikes.is_empty());
        assert_eq!(result.report.active_strikes.len(), 1);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let h = harness();

        for severity in [0, 6, -1] {
            let err = h.service.strike(USER, MOD, severity, None, t()).await.unwrap_err();
            assert!(matches!(err, ModerationError::Validation(_)));
        }
        for hours in [0.0, -2.0, f64::NAN, 10_000.0] {
            let err = h.service.self_timeout(USER, hours, t()).await.unwrap_err();
            assert!(matches!(err, ModerationError::Validation(_)));
        }
        let err = h
            .service
            .warn(USER, MOD, "   ".to_string(), t())
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::Validation(_)));

        assert_eq!(h.store.len(), 0);
        assert_eq!(h.flag.mutations(), 0);
    }

    #[tokio::test]
    async fn test_unknown_strike_is_not_found() {
        let h = harness();

        let err = h.service.remove_strike(42, MOD, t()).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
        let err = h.service.edit_severity(42, MOD, 2, t()).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
        let err = h
            .service
            .edit_comment(42, MOD, "typo".to_string(), t())
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_release_row_is_not_a_removable_strike() {
        let h = harness();
        let release = h.service.release(USER, MOD, false, None, t()).await.unwrap();
        let release_id = release.pit.unwrap().entry_id;

        let err = h.service.remove_strike(release_id, MOD, t()).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_removing_strike_unpits() {
        let h = harness();
        let struck = h.service.strike(USER, MOD, 2, None, t()).await.unwrap();
        let strike_id = struck.pit.unwrap().entry_id;

        let result = h
            .service
            .remove_strike(strike_id, MOD, t() + Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(result.sync, Some(SyncOutcome::Unflagged));
        assert!(result.pit.is_none());
        assert!(!h.flag.contains(USER));

        // Removing twice changes nothing
        let again = h
            .service
            .remove_strike(strike_id, MOD, t() + Duration::minutes(6))
            .await
            .unwrap();
        assert!(!again.inserted);
    }

    #[tokio::test]
    async fn test_edit_severity_recomputes_release() {
        let h = harness();
        let struck = h.service.strike(USER, MOD, 1, None, t()).await.unwrap();
        let strike_id = struck.pit.unwrap().entry_id;

        let result = h
            .service
            .edit_severity(strike_id, MOD, 5, t() + Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(
            result.action,
            ModerationAction::EditSeverity {
                strike_id,
                from: 1,
                to: 5
            }
        );
        assert_eq!(result.pit.unwrap().release_time, t() + Duration::hours(48));
    }

    #[tokio::test]
    async fn test_edit_comment_updates_reason() {
        let h = harness();
        let struck = h.service.strike(USER, MOD, 1, None, t()).await.unwrap();
        let strike_id = struck.pit.unwrap().entry_id;

        let result = h
            .service
            .edit_comment(strike_id, MOD, "raiding".to_string(), t())
            .await
            .unwrap();

        assert_eq!(result.pit.unwrap().reason.as_deref(), Some("raiding"));
        assert_eq!(result.sync, Some(SyncOutcome::Unchanged));
    }

    #[tokio::test]
    async fn test_warnings_do_not_pit() {
        let h = harness();

        let result = h
            .service
            .warn(USER, MOD, "tone it down".to_string(), t())
            .await
            .unwrap();

        assert!(result.pit.is_none());
        assert_eq!(result.sync, Some(SyncOutcome::Unchanged));
        let listed = h.service.list_warnings(USER, t()).await.unwrap();
        assert_eq!(listed.report.warnings.len(), 1);
        assert_eq!(listed.sync, None);
    }

    #[tokio::test]
    async fn test_self_timeout_is_silent() {
        let h = harness();

        let result = h.service.self_timeout(USER, 1.5, t()).await.unwrap();

        let pit = result.pit.unwrap();
        assert_eq!(pit.source, PitSource::TimedPenalty);
        assert_eq!(pit.release_time, t() + Duration::minutes(90));
        assert!(h.flag.contains(USER));
        assert!(h.notifier.dms().is_empty());
    }

    #[tokio::test]
    async fn test_flag_failure_keeps_ledger_change() {
        let h = harness();
        h.flag.fail_writes();

        let result = h
            .service
            .manual_timeout(USER, MOD, 2.0, Some("cool off".to_string()), t())
            .await
            .unwrap();

        assert!(result.inserted);
        assert!(result.flag_error.is_some());
        assert!(result.pit.unwrap().active);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_dispatches_commands() {
        let h = harness();

        let result = h
            .service
            .execute(
                PitCommand::MinigamePenalty {
                    user_id: USER,
                    duration: Duration::minutes(30),
                    comment: Some("roulette".to_string()),
                },
                t(),
            )
            .await
            .unwrap();
        assert_eq!(result.pit.unwrap().source, PitSource::MinigamePenalty);

        let status = h
            .service
            .execute(PitCommand::Status { user_id: USER }, t() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(status.action, ModerationAction::Status);
        assert!(!status.pit.unwrap().active);
    }

    #[tokio::test]
    async fn test_resync_restores_role_after_rejoin() {
        let h = harness();
        h.service.strike(USER, MOD, 2, None, t()).await.unwrap();
        // Rejoining members come back without roles
        h.flag.set_flagged(USER, false, "left").await.unwrap();
        let dms = h.notifier.dms().len();

        let outcome = h
            .service
            .resync(USER, t() + Duration::hours(1), None)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Flagged);
        assert!(h.flag.contains(USER));
        assert_eq!(h.notifier.dms().len(), dms);
    }

    #[tokio::test]
    async fn test_newly_expired_reported_once() {
        let h = harness();
        h.service.strike(USER, MOD, 1, None, t()).await.unwrap();
        let later = t() + Duration::days(31);

        let first = h.service.take_newly_expired(USER, later).await.unwrap();
        let second = h.service.take_newly_expired(USER, later).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }
}
