use super::ModerationAction;
use super::error::{ModerationError, PitResult};
use super::ledger::LedgerEntry;
use super::reconcile::Pit;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The externally visible suspension flag (the pit role). A cache of the
/// engine's decision, never the source of truth.
#[async_trait::async_trait]
pub trait SuspensionFlag: Send + Sync {
    /// `None` when the user is not in the guild and carries no flag to sync.
    async fn is_flagged(&self, user_id: u64) -> PitResult<Option<bool>>;

    async fn set_flagged(&self, user_id: u64, flagged: bool, reason: &str) -> PitResult<()>;

    /// Everyone currently carrying the flag, however it got there.
    async fn flagged_users(&self) -> PitResult<Vec<u64>>;
}

/// Outbound messages. Both channels may fail independently.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn direct_message(&self, user_id: u64, notice: &Notice) -> PitResult<()>;

    async fn log(&self, notice: &Notice) -> PitResult<()>;
}

/// Structured notification payload; rendering belongs to the notifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Pitted {
        user_id: u64,
        pit: Pit,
        reason: String,
    },
    Released {
        user_id: u64,
        reason: String,
    },
    StrikeExpired {
        user_id: u64,
        strike: LedgerEntry,
    },
    Action {
        user_id: u64,
        moderator_id: Option<u64>,
        action: ModerationAction,
        pit: Option<Pit>,
    },
    FlagFailed {
        user_id: u64,
        flagged: bool,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Flagged,
    Unflagged,
    /// The user is not in the guild; the join handler syncs them on return.
    Absent,
}

/// Applies a computed pit to the suspension flag, acting only on transitions.
pub struct Synchronizer {
    flag: Arc<dyn SuspensionFlag>,
    notifier: Arc<dyn Notifier>,
}

impl Synchronizer {
    pub fn new(flag: Arc<dyn SuspensionFlag>, notifier: Arc<dyn Notifier>) -> Self {
        Self { flag, notifier }
    }

    /// Flips the flag when it disagrees with `pit` and, if a `reason` is given,
    /// sends the user exactly one DM about it. Agreement is a no-op.
    ///
    /// A failed flip is reported to the log channel and returned; it is not
    /// retried.
    pub async fn sync(
        &self,
        user_id: u64,
        pit: Option<&Pit>,
        reason: Option<&str>,
    ) -> PitResult<SyncOutcome> {
        let wanted = pit.is_some_and(|pit| pit.active);
        let Some(observed) = self.flag.is_flagged(user_id).await? else {
            debug!("User {} is not in the guild, pit role left alone", user_id);
            return Ok(SyncOutcome::Absent);
        };

        if wanted == observed {
            return Ok(SyncOutcome::Unchanged);
        }

        let audit_reason = reason.unwrap_or("Pit status changed");
        if let Err(e) = self.flag.set_flagged(user_id, wanted, audit_reason).await {
            warn!("Failed to update pit role for user {}: {}", user_id, e);
            self.log(&Notice::FlagFailed {
                user_id,
                flagged: wanted,
                error: e.to_string(),
            })
            .await;
            return Err(match e {
                ModerationError::ExternalState(_) => e,
                other => ModerationError::ExternalState(other.to_string()),
            });
        }

        info!(
            "Pit role {} for user {}",
            if wanted { "added" } else { "removed" },
            user_id
        );

        if let Some(reason) = reason {
            let notice = match pit.filter(|pit| pit.active) {
                Some(pit) => Notice::Pitted {
                    user_id,
                    pit: pit.clone(),
                    reason: reason.to_string(),
                },
                None => Notice::Released {
                    user_id,
                    reason: reason.to_string(),
                },
            };
            self.direct_message(user_id, &notice).await;
        }

        Ok(if wanted {
            SyncOutcome::Flagged
        } else {
            SyncOutcome::Unflagged
        })
    }

    pub async fn flagged_users(&self) -> PitResult<Vec<u64>> {
        self.flag.flagged_users().await
    }

    /// Sends a DM; delivery failures are logged and swallowed.
    pub async fn direct_message(&self, user_id: u64, notice: &Notice) {
        if let Err(e) = self.notifier.direct_message(user_id, notice).await {
            warn!("Could not DM user {}: {}", user_id, e);
        }
    }

    /// Writes to the log channel; delivery failures are logged and swallowed.
    pub async fn log(&self, notice: &Notice) {
        if let Err(e) = self.notifier.log(notice).await {
            warn!("Could not write to the log channel: {}", e);
        }
    }
}
