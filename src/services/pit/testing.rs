//! In-memory collaborators for exercising the pit engine without Discord or a database.

use super::error::{ModerationError, PitResult};
use super::ledger::{EntryKind, LedgerEntry, LedgerStore, NewEntry, RELEASE_SEVERITY};
use super::sync::{Notice, Notifier, SuspensionFlag};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mirrors the four ledger tables: ids and the timestamp constraint are per table.
fn table(kind: EntryKind) -> usize {
    match kind {
        EntryKind::Strike | EntryKind::Release => 0,
        EntryKind::Warning => 1,
        EntryKind::TimedPenalty => 2,
        EntryKind::MinigamePenalty => 3,
    }
}

#[derive(Default)]
struct MemoryLedger {
    next_ids: [i32; 4],
    rows: Vec<LedgerEntry>,
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<MemoryLedger>,
}

impl MemoryLedgerStore {
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn append(&self, entry: NewEntry) -> PitResult<Option<i32>> {
        let mut ledger = self.inner.lock().unwrap();
        let slot = table(entry.kind);

        let collides = ledger.rows.iter().any(|row| {
            table(row.kind) == slot
                && row.user_id == entry.user_id
                && row.timestamp == entry.timestamp
        });
        if collides {
            return Ok(None);
        }

        ledger.next_ids[slot] += 1;
        let id = ledger.next_ids[slot];
        ledger.rows.push(LedgerEntry {
            id,
            user_id: entry.user_id,
            moderator_id: entry.moderator_id,
            kind: entry.kind,
            severity: entry.severity,
            comment: entry.comment,
            timestamp: entry.timestamp,
            duration: entry.duration,
            expired: false,
        });
        Ok(Some(id))
    }

    async fn all(&self, user_id: u64) -> PitResult<Vec<LedgerEntry>> {
        let ledger = self.inner.lock().unwrap();
        let mut rows: Vec<_> = ledger
            .rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(rows)
    }

    async fn get(&self, id: i32) -> PitResult<Option<LedgerEntry>> {
        let ledger = self.inner.lock().unwrap();
        Ok(ledger
            .rows
            .iter()
            .find(|row| row.kind.is_strike_shaped() && row.id == id)
            .cloned())
    }

    async fn update_comment(&self, id: i32, comment: Option<String>) -> PitResult<bool> {
        let mut ledger = self.inner.lock().unwrap();
        match ledger
            .rows
            .iter_mut()
            .find(|row| row.kind.is_strike_shaped() && row.id == id)
        {
            Some(row) => {
                row.comment = comment;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_severity(&self, id: i32, severity: i32) -> PitResult<bool> {
        let mut ledger = self.inner.lock().unwrap();
        match ledger
            .rows
            .iter_mut()
            .find(|row| row.kind.is_strike_shaped() && row.id == id)
        {
            Some(row) => {
                row.severity = severity;
                row.kind = if severity <= RELEASE_SEVERITY {
                    EntryKind::Release
                } else {
                    EntryKind::Strike
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_expired(&self, ids: &[i32]) -> PitResult<()> {
        let mut ledger = self.inner.lock().unwrap();
        for row in ledger.rows.iter_mut() {
            if row.kind.is_strike_shaped() && ids.contains(&row.id) {
                row.expired = true;
            }
        }
        Ok(())
    }

    async fn users_since(&self, since: DateTime<Utc>) -> PitResult<Vec<u64>> {
        let ledger = self.inner.lock().unwrap();
        let users: BTreeSet<u64> = ledger
            .rows
            .iter()
            .filter(|row| row.timestamp > since)
            .map(|row| row.user_id)
            .collect();
        Ok(users.into_iter().collect())
    }
}

/// Suspension flag backed by a set, counting every write attempt.
#[derive(Default)]
pub struct RecordingFlag {
    flagged: Mutex<HashSet<u64>>,
    absent: Mutex<HashSet<u64>>,
    mutations: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingFlag {
    /// Flags a user without counting it as a mutation.
    pub fn preset(&self, user_id: u64) {
        self.flagged.lock().unwrap().insert(user_id);
    }

    /// Makes the user look like they left the guild.
    pub fn mark_absent(&self, user_id: u64) {
        self.absent.lock().unwrap().insert(user_id);
    }

    pub fn contains(&self, user_id: u64) -> bool {
        self.flagged.lock().unwrap().contains(&user_id)
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SuspensionFlag for RecordingFlag {
    async fn is_flagged(&self, user_id: u64) -> PitResult<Option<bool>> {
        if self.absent.lock().unwrap().contains(&user_id) {
            return Ok(None);
        }
        Ok(Some(self.contains(user_id)))
    }

    async fn set_flagged(&self, user_id: u64, flagged: bool, _reason: &str) -> PitResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ModerationError::ExternalState(
                "Missing Permissions".to_string(),
            ));
        }
        let mut set = self.flagged.lock().unwrap();
        if flagged {
            set.insert(user_id);
        } else {
            set.remove(&user_id);
        }
        Ok(())
    }

    async fn flagged_users(&self) -> PitResult<Vec<u64>> {
        let mut users: Vec<u64> = self.flagged.lock().unwrap().iter().copied().collect();
        users.sort_unstable();
        Ok(users)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    dms: Mutex<Vec<(u64, Notice)>>,
    logs: Mutex<Vec<Notice>>,
    fail_dms: AtomicBool,
}

impl RecordingNotifier {
    pub fn dms(&self) -> Vec<(u64, Notice)> {
        self.dms.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<Notice> {
        self.logs.lock().unwrap().clone()
    }

    pub fn fail_dms(&self) {
        self.fail_dms.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn direct_message(&self, user_id: u64, notice: &Notice) -> PitResult<()> {
        if self.fail_dms.load(Ordering::SeqCst) {
            return Err(ModerationError::NotificationDelivery(
                "Cannot send messages to this user".to_string(),
            ));
        }
        self.dms.lock().unwrap().push((user_id, notice.clone()));
        Ok(())
    }

    async fn log(&self, notice: &Notice) -> PitResult<()> {
        self.logs.lock().unwrap().push(notice.clone());
        Ok(())
    }
}
