use super::error::PitResult;
use super::ledger::{EntryKind, LedgerEntry, LedgerStore, NewEntry};
use crate::db::entities::{minigame_penalties, strikes, timeouts, warnings};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::BTreeSet;

/// Ledger store backed by the `strikes`, `warnings`, `timeouts` and
/// `minigame_penalties` tables.
pub struct DbLedgerStore {
    db: DatabaseConnection,
}

impl DbLedgerStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Maps the "nothing inserted" outcome of `ON CONFLICT DO NOTHING` to `None`.
fn inserted(result: Result<i32, DbErr>) -> PitResult<Option<i32>> {
    match result {
        Ok(id) => Ok(Some(id)),
        Err(DbErr::RecordNotInserted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn naive(at: DateTime<Utc>) -> NaiveDateTime {
    at.naive_utc()
}

fn strike_entry(model: strikes::Model) -> LedgerEntry {
    LedgerEntry {
        id: model.id,
        user_id: model.user_id as u64,
        moderator_id: model.moderator_id.map(|id| id as u64),
        kind: if model.severity < 0 {
            EntryKind::Release
        } else {
            EntryKind::Strike
        },
        severity: model.severity,
        comment: model.comment,
        timestamp: model.created_at.and_utc(),
        duration: None,
        expired: model.expired,
    }
}

fn warning_entry(model: warnings::Model) -> LedgerEntry {
    LedgerEntry {
        id: model.id,
        user_id: model.user_id as u64,
        moderator_id: model.moderator_id.map(|id| id as u64),
        kind: EntryKind::Warning,
        severity: 0,
        comment: model.comment,
        timestamp: model.created_at.and_utc(),
        duration: None,
        expired: false,
    }
}

fn timeout_entry(model: timeouts::Model) -> LedgerEntry {
    LedgerEntry {
        id: model.id,
        user_id: model.user_id as u64,
        moderator_id: model.moderator_id.map(|id| id as u64),
        kind: EntryKind::TimedPenalty,
        severity: 0,
        comment: model.comment,
        timestamp: model.created_at.and_utc(),
        duration: Some(Duration::milliseconds(model.duration_ms)),
        expired: false,
    }
}

fn minigame_entry(model: minigame_penalties::Model) -> LedgerEntry {
    LedgerEntry {
        id: model.id,
        user_id: model.user_id as u64,
        moderator_id: None,
        kind: EntryKind::MinigamePenalty,
        severity: 0,
        comment: model.comment,
        timestamp: model.created_at.and_utc(),
        duration: Some(Duration::milliseconds(model.duration_ms)),
        expired: false,
    }
}

#[async_trait::async_trait]
impl LedgerStore for DbLedgerStore {
    async fn append(&self, entry: NewEntry) -> PitResult<Option<i32>> {
        let user_id = entry.user_id as i64;
        let moderator_id = entry.moderator_id.map(|id| id as i64);
        let created_at = naive(entry.timestamp);
        let duration_ms = entry.duration.map_or(0, |d| d.num_milliseconds());

        match entry.kind {
            EntryKind::Strike | EntryKind::Release => inserted(
                strikes::Entity::insert(strikes::ActiveModel {
                    user_id: Set(user_id),
                    moderator_id: Set(moderator_id),
                    severity: Set(entry.severity),
                    comment: Set(entry.comment),
                    created_at: Set(created_at),
                    expired: Set(false),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([strikes::Column::UserId, strikes::Column::CreatedAt])
                        .do_nothing()
                        .to_owned(),
                )
                .exec(&self.db)
                .await
                .map(|res| res.last_insert_id),
            ),
            EntryKind::Warning => inserted(
                warnings::Entity::insert(warnings::ActiveModel {
                    user_id: Set(user_id),
                    moderator_id: Set(moderator_id),
                    comment: Set(entry.comment),
                    created_at: Set(created_at),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([warnings::Column::UserId, warnings::Column::CreatedAt])
                        .do_nothing()
                        .to_owned(),
                )
                .exec(&self.db)
                .await
                .map(|res| res.last_insert_id),
            ),
            EntryKind::TimedPenalty => inserted(
                timeouts::Entity::insert(timeouts::ActiveModel {
                    user_id: Set(user_id),
                    moderator_id: Set(moderator_id),
                    comment: Set(entry.comment),
                    created_at: Set(created_at),
                    duration_ms: Set(duration_ms),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([timeouts::Column::UserId, timeouts::Column::CreatedAt])
                        .do_nothing()
                        .to_owned(),
                )
                .exec(&self.db)
                .await
                .map(|res| res.last_insert_id),
            ),
            EntryKind::MinigamePenalty => inserted(
                minigame_penalties::Entity::insert(minigame_penalties::ActiveModel {
                    user_id: Set(user_id),
                    comment: Set(entry.comment),
                    created_at: Set(created_at),
                    duration_ms: Set(duration_ms),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([
                        minigame_penalties::Column::UserId,
                        minigame_penalties::Column::CreatedAt,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec(&self.db)
                .await
                .map(|res| res.last_insert_id),
            ),
        }
    }

    async fn all(&self, user_id: u64) -> PitResult<Vec<LedgerEntry>> {
        let uid = user_id as i64;

        let mut entries: Vec<LedgerEntry> = strikes::Entity::find()
            .filter(strikes::Column::UserId.eq(uid))
            .order_by_desc(strikes::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(strike_entry)
            .collect();

        entries.extend(
            warnings::Entity::find()
                .filter(warnings::Column::UserId.eq(uid))
                .all(&self.db)
                .await?
                .into_iter()
                .map(warning_entry),
        );

        entries.extend(
            timeouts::Entity::find()
                .filter(timeouts::Column::UserId.eq(uid))
                .all(&self.db)
                .await?
                .into_iter()
                .map(timeout_entry),
        );

        entries.extend(
            minigame_penalties::Entity::find()
                .filter(minigame_penalties::Column::UserId.eq(uid))
                .all(&self.db)
                .await?
                .into_iter()
                .map(minigame_entry),
        );

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    async fn get(&self, id: i32) -> PitResult<Option<LedgerEntry>> {
        Ok(strikes::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(strike_entry))
    }

    async fn update_comment(&self, id: i32, comment: Option<String>) -> PitResult<bool> {
        let Some(model) = strikes::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(false);
        };

        let mut am: strikes::ActiveModel = model.into();
        am.comment = Set(comment);
        am.update(&self.db).await?;
        Ok(true)
    }

    async fn update_severity(&self, id: i32, severity: i32) -> PitResult<bool> {
        let Some(model) = strikes::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(false);
        };

        let mut am: strikes::ActiveModel = model.into();
        am.severity = Set(severity);
        am.update(&self.db).await?;
        Ok(true)
    }

    async fn mark_expired(&self, ids: &[i32]) -> PitResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        strikes::Entity::update_many()
            .col_expr(strikes::Column::Expired, Expr::value(true))
            .filter(strikes::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn users_since(&self, since: DateTime<Utc>) -> PitResult<Vec<u64>> {
        let since = naive(since);
        let mut users = BTreeSet::new();

        users.extend(
            strikes::Entity::find()
                .select_only()
                .column(strikes::Column::UserId)
                .distinct()
                .filter(strikes::Column::CreatedAt.gt(since))
                .into_tuple::<i64>()
                .all(&self.db)
                .await?,
        );
        users.extend(
            timeouts::Entity::find()
                .select_only()
                .column(timeouts::Column::UserId)
                .distinct()
                .filter(timeouts::Column::CreatedAt.gt(since))
                .into_tuple::<i64>()
                .all(&self.db)
                .await?,
        );
        users.extend(
            minigame_penalties::Entity::find()
                .select_only()
                .column(minigame_penalties::Column::UserId)
                .distinct()
                .filter(minigame_penalties::Column::CreatedAt.gt(since))
                .into_tuple::<i64>()
                .all(&self.db)
                .await?,
        );

        Ok(users.into_iter().map(|id| id as u64).collect())
    }
}
