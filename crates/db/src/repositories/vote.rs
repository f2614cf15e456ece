//! Vote ledger repository.
//!
//! Question and answer votes live in two tables with the same shape:
//! one row per (user, target) holding -1, 0 or 1.

use std::sync::Arc;

use hasker_common::{AppError, AppResult};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, Statement,
    TransactionTrait,
};
use tracing::debug;

/// Kind of vote target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteKind {
    Question,
    Answer,
}

impl VoteKind {
    /// Ledger table for this kind.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Question => "question_vote",
            Self::Answer => "answer_vote",
        }
    }

    /// Column holding the target id.
    #[must_use]
    pub const fn target_column(self) -> &'static str {
        match self {
            Self::Question => "question_id",
            Self::Answer => "answer_id",
        }
    }
}

/// Result of a ledger update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The ledger row now holds `value`.
    Applied { previous: i16, value: i16 },
    /// The step function refused; nothing was written.
    Rejected { current: i16 },
}

/// Vote ledger repository.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Read-modify-write the ledger row for (user, target) in one transaction.
    ///
    /// `step` maps the current value (0 when no row exists) to the new value,
    /// or `None` to reject. An existing row is locked with `FOR UPDATE` before
    /// `step` runs. A missing row is inserted with the new value directly; if
    /// a concurrent request inserted it first, the row is locked and `step`
    /// runs again against the stored value.
    pub async fn apply<F>(
        &self,
        kind: VoteKind,
        record_id: &str,
        user_id: &str,
        target_id: &str,
        step: F,
    ) -> AppResult<VoteOutcome>
    where
        F: Fn(i16) -> Option<i16>,
    {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let outcome = match Self::lock_current(&txn, kind, user_id, target_id).await? {
            Some(current) => {
                Self::update_locked(&txn, kind, user_id, target_id, current, &step).await?
            }
            None => match step(0) {
                None => VoteOutcome::Rejected { current: 0 },
                Some(value) => {
                    let inserted =
                        Self::insert_new(&txn, kind, record_id, user_id, target_id, value).await?;
                    if inserted {
                        VoteOutcome::Applied { previous: 0, value }
                    } else {
                        debug!(
                            kind = ?kind,
                            user_id = %user_id,
                            target_id = %target_id,
                            "Vote row inserted concurrently, retrying as update"
                        );
                        let current = Self::lock_current(&txn, kind, user_id, target_id)
                            .await?
                            .ok_or_else(|| {
                                AppError::Database("vote row vanished after conflict".to_string())
                            })?;
                        Self::update_locked(&txn, kind, user_id, target_id, current, &step).await?
                    }
                }
            },
        };

        match outcome {
            VoteOutcome::Applied { .. } => txn.commit().await,
            VoteOutcome::Rejected { .. } => txn.rollback().await,
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(outcome)
    }

    /// Sum of all ledger values for a target; 0 when there are none.
    pub async fn total(&self, kind: VoteKind, target_id: &str) -> AppResult<i64> {
        let sql = format!(
            "SELECT COALESCE(SUM(vote), 0)::bigint AS total FROM {} WHERE {} = $1",
            kind.table(),
            kind.target_column()
        );

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                [target_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(row) => row
                .try_get::<i64>("", "total")
                .map_err(|e| AppError::Database(e.to_string())),
            None => Ok(0),
        }
    }

    /// Current ledger value for (user, target), if a row exists.
    pub async fn find_value(
        &self,
        kind: VoteKind,
        user_id: &str,
        target_id: &str,
    ) -> AppResult<Option<i16>> {
        let sql = format!(
            "SELECT vote FROM {} WHERE user_id = $1 AND {} = $2",
            kind.table(),
            kind.target_column()
        );

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                [user_id.into(), target_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(|r| r.try_get::<i16>("", "vote"))
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn lock_current(
        txn: &DatabaseTransaction,
        kind: VoteKind,
        user_id: &str,
        target_id: &str,
    ) -> AppResult<Option<i16>> {
        let sql = format!(
            "SELECT vote FROM {} WHERE user_id = $1 AND {} = $2 FOR UPDATE",
            kind.table(),
            kind.target_column()
        );

        let row = txn
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                [user_id.into(), target_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(|r| r.try_get::<i16>("", "vote"))
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_locked<F>(
        txn: &DatabaseTransaction,
        kind: VoteKind,
        user_id: &str,
        target_id: &str,
        current: i16,
        step: &F,
    ) -> AppResult<VoteOutcome>
    where
        F: Fn(i16) -> Option<i16>,
    {
        let Some(value) = step(current) else {
            return Ok(VoteOutcome::Rejected { current });
        };

        let sql = format!(
            "UPDATE {} SET vote = $1 WHERE user_id = $2 AND {} = $3",
            kind.table(),
            kind.target_column()
        );

        txn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &sql,
            [value.into(), user_id.into(), target_id.into()],
        ))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(VoteOutcome::Applied {
            previous: current,
            value,
        })
    }

    /// Returns false when another transaction already holds the row.
    async fn insert_new(
        txn: &DatabaseTransaction,
        kind: VoteKind,
        record_id: &str,
        user_id: &str,
        target_id: &str,
        value: i16,
    ) -> AppResult<bool> {
        let sql = format!(
            "INSERT INTO {table} (id, user_id, {col}, vote) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, {col}) DO NOTHING",
            table = kind.table(),
            col = kind.target_column()
        );

        let result = txn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                [
                    record_id.into(),
                    user_id.into(),
                    target_id.into(),
                    value.into(),
                ],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
