use super::error::PitResult;
use chrono::{DateTime, Duration, Utc};

/// Severity written on a strike-shaped row to mark an explicit release.
pub const RELEASE_SEVERITY: i32 = -1;
/// Severity written on a strike-shaped row once it is struck from the record.
pub const REMOVED_SEVERITY: i32 = 0;
pub const MIN_SEVERITY: i32 = 1;
pub const MAX_SEVERITY: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Strike,
    Release,
    TimedPenalty,
    MinigamePenalty,
    Warning,
}

impl EntryKind {
    /// Strikes and releases share the `strikes` table.
    pub fn is_strike_shaped(self) -> bool {
        matches!(self, Self::Strike | Self::Release)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Strike => write!(f, "strike"),
            EntryKind::Release => write!(f, "release"),
            EntryKind::TimedPenalty => write!(f, "timeout"),
            EntryKind::MinigamePenalty => write!(f, "minigame_penalty"),
            EntryKind::Warning => write!(f, "warning"),
        }
    }
}

/// One row of a user's moderation history.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: i32,
    pub user_id: u64,
    pub moderator_id: Option<u64>,
    pub kind: EntryKind,
    /// Only meaningful on strike-shaped rows, zero elsewhere.
    pub severity: i32,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Set for timed and minigame penalties only.
    pub duration: Option<Duration>,
    pub expired: bool,
}

impl LedgerEntry {
    pub fn is_release(&self) -> bool {
        self.kind.is_strike_shaped() && self.severity < 0
    }

    pub fn is_removed(&self) -> bool {
        self.kind.is_strike_shaped() && self.severity == REMOVED_SEVERITY
    }

    /// A strike that still counts, i.e. neither a release nor removed.
    pub fn is_standing_strike(&self) -> bool {
        self.kind == EntryKind::Strike && self.severity > REMOVED_SEVERITY
    }

    /// `timestamp + duration` for penalty rows.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.duration.map(|d| self.timestamp + d)
    }
}

/// A row about to be appended; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub user_id: u64,
    pub moderator_id: Option<u64>,
    pub kind: EntryKind,
    pub severity: i32,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration: Option<Duration>,
}

impl NewEntry {
    pub fn strike(
        user_id: u64,
        moderator_id: u64,
        severity: i32,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            moderator_id: Some(moderator_id),
            kind: EntryKind::Strike,
            severity,
            comment,
            timestamp: at,
            duration: None,
        }
    }

    pub fn release(
        user_id: u64,
        moderator_id: u64,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            moderator_id: Some(moderator_id),
            kind: EntryKind::Release,
            severity: RELEASE_SEVERITY,
            comment,
            timestamp: at,
            duration: None,
        }
    }

    pub fn warning(
        user_id: u64,
        moderator_id: u64,
        comment: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            moderator_id: Some(moderator_id),
            kind: EntryKind::Warning,
            severity: 0,
            comment: Some(comment),
            timestamp: at,
            duration: None,
        }
    }

    /// Timed penalty without a strike; `moderator_id` is `None` for self-timeouts.
    pub fn timed_penalty(
        user_id: u64,
        moderator_id: Option<u64>,
        duration: Duration,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            moderator_id,
            kind: EntryKind::TimedPenalty,
            severity: 0,
            comment,
            timestamp: at,
            duration: Some(duration),
        }
    }

    pub fn minigame_penalty(
        user_id: u64,
        duration: Duration,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            moderator_id: None,
            kind: EntryKind::MinigamePenalty,
            severity: 0,
            comment,
            timestamp: at,
            duration: Some(duration),
        }
    }
}

/// Append-only persistence for the moderation ledger. Holds no policy.
///
/// Timestamps are unique per user within a table; appending a row whose
/// `(user_id, timestamp)` already exists is a silent no-op that returns `None`.
/// This absorbs duplicate event delivery from the gateway.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, entry: NewEntry) -> PitResult<Option<i32>>;

    /// Every row for the user across all tables, newest first.
    async fn all(&self, user_id: u64) -> PitResult<Vec<LedgerEntry>>;

    /// Looks up a strike-shaped row.
    async fn get(&self, id: i32) -> PitResult<Option<LedgerEntry>>;

    /// Returns `false` when no strike-shaped row has this id.
    async fn update_comment(&self, id: i32, comment: Option<String>) -> PitResult<bool>;

    async fn update_severity(&self, id: i32, severity: i32) -> PitResult<bool>;

    async fn mark_expired(&self, ids: &[i32]) -> PitResult<()>;

    /// Users with any row newer than `since`.
    async fn users_since(&self, since: DateTime<Utc>) -> PitResult<Vec<u64>>;
}
