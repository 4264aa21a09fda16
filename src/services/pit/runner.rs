use super::sync::{Notice, SyncOutcome};
use super::{PitResult, PitService};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

/// Counters for one pass over the at-risk users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub checked: usize,
    pub flagged: usize,
    pub unflagged: usize,
    pub absent: usize,
    pub expired_strikes: usize,
    pub failed: usize,
}

impl PitService {
    /// Starts the background task that re-checks every at-risk user on the
    /// configured interval. Each sweep is awaited before the next tick and
    /// missed ticks are skipped, so runs never overlap.
    pub fn start_sweep_runner(self: Arc<Self>) {
        tokio::spawn(async move {
            info!(
                "Pit sweep runner started (every {:?}).",
                self.config.sweep_interval
            );
            let mut ticker = interval(self.config.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match self.sweep(Utc::now()).await {
                    Ok(Some(summary)) => {
                        if summary.flagged + summary.unflagged + summary.failed > 0 {
                            info!("Pit sweep finished: {:?}", summary);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => error!("Pit sweep failed: {:?}", e),
                }
            }
        });
    }

    /// One pass over every user with recent ledger activity or the flag.
    /// Returns `None` when another sweep is still in progress.
    pub async fn sweep(&self, now: DateTime<Utc>) -> PitResult<Option<SweepSummary>> {
        let Ok(_guard) = self.sweeping.try_lock() else {
            warn!("Previous pit sweep still running, skipping this one");
            return Ok(None);
        };

        let mut users: BTreeSet<u64> = self
            .store
            .users_since(now - self.sweep_lookback())
            .await?
            .into_iter()
            .collect();
        match self.sync.flagged_users().await {
            Ok(flagged) => users.extend(flagged),
            Err(e) => warn!("Could not list pit role holders, sweeping ledger users only: {}", e),
        }
        let mut summary = SweepSummary::default();

        for user_id in users {
            summary.checked += 1;
            match self.sweep_user(user_id, now).await {
                Ok((outcome, expired)) => {
                    summary.expired_strikes += expired;
                    match outcome {
                        SyncOutcome::Flagged => summary.flagged += 1,
                        SyncOutcome::Unflagged => summary.unflagged += 1,
                        SyncOutcome::Absent => summary.absent += 1,
                        SyncOutcome::Unchanged => {}
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!("Pit sweep could not reconcile user {}: {}", user_id, e);
                }
            }
        }

        Ok(Some(summary))
    }

    async fn sweep_user(&self, user_id: u64, now: DateTime<Utc>) -> PitResult<(SyncOutcome, usize)> {
        let report = self.report(user_id, now).await?;

        let expired = self.record_expiries(&report).await?;
        for strike in &expired {
            self.sync
                .direct_message(
                    user_id,
                    &Notice::StrikeExpired {
                        user_id,
                        strike: strike.clone(),
                    },
                )
                .await;
        }

        let pit = report.current_pit();
        let reason = if pit.as_ref().is_some_and(|pit| pit.active) {
            "Pit reapplied"
        } else {
            "Pit time served"
        };
        let outcome = self.sync.sync(user_id, pit.as_ref(), Some(reason)).await?;

        Ok((outcome, expired.len()))
    }

    /// How far back a row can be and still influence the pit right now.
    fn sweep_lookback(&self) -> Duration {
        let tick = Duration::from_std(self.config.sweep_interval)
            .unwrap_or_else(|_| Duration::minutes(1));
        self.config.horizon.max(self.config.max_timeout) + tick * 2
    }
}
