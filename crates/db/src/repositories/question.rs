//! Question repository.

use std::sync::Arc;

use crate::entities::{Question, question, tag};
use crate::repositories::{
    TagRepository,
    ordering::{ListOrder, RankKey},
};
use hasker_common::{AppError, AppResult, DEFAULT_AVATAR_URL};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction,
    EntityTrait, FromQueryResult, Statement, TransactionTrait, Value,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;

/// A question row with its author and aggregates.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: String,
    pub title: String,
    pub text: String,
    pub author_id: String,
    pub author_username: String,
    /// Uploaded avatar, or the default one.
    pub author_avatar_url: String,
    pub creation_date: DateTimeWithTimeZone,
    /// Sum of question votes.
    pub votes: i64,
    pub answers_count: i64,
}

impl QuestionSummary {
    #[must_use]
    pub fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            votes: self.votes,
            creation_date: self.creation_date,
            id: &self.id,
        }
    }
}

/// Which questions a summary query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilter<'a> {
    All,
    Id(&'a str),
    /// Substring of title or body.
    Text(&'a str),
    /// Questions carrying this exact tag.
    Tag(&'a str),
}

impl QuestionFilter<'_> {
    /// `WHERE` body and bind values, parameters starting at `$1`.
    fn where_clause(self) -> (String, Vec<Value>) {
        match self {
            Self::All => ("TRUE".to_string(), vec![]),
            Self::Id(id) => ("q.id = $1".to_string(), vec![id.into()]),
            Self::Text(text) => (
                r"(q.title LIKE $1 ESCAPE '\' OR q.text LIKE $1 ESCAPE '\')".to_string(),
                vec![like_pattern(text).into()],
            ),
            Self::Tag(tag) => (
                "EXISTS (SELECT 1 FROM question_tag qt JOIN tag t ON t.id = qt.tag_id \
                 WHERE qt.question_id = q.id AND t.text = $1)"
                    .to_string(),
                vec![tag.into()],
            ),
        }
    }
}

/// `%text%` with LIKE metacharacters escaped.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn summary_select() -> String {
    format!(
        r#"
    SELECT
        q.id, q.title, q.text, q.author_id,
        u.username AS author_username,
        COALESCE(p.avatar_url, '{DEFAULT_AVATAR_URL}') AS author_avatar_url,
        q.creation_date,
        COALESCE(v.votes, 0)::bigint AS votes,
        COALESCE(a.answers_count, 0)::bigint AS answers_count
    FROM question q
    JOIN "user" u ON u.id = q.author_id
    LEFT JOIN user_profile p ON p.user_id = q.author_id
    LEFT JOIN (
        SELECT question_id, SUM(vote) AS votes FROM question_vote GROUP BY question_id
    ) v ON v.question_id = q.id
    LEFT JOIN (
        SELECT question_id, COUNT(*) AS answers_count FROM answer GROUP BY question_id
    ) a ON a.question_id = q.id
"#
    )
}

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a question by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a question by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<question::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(id.to_string()))
    }

    /// Insert a question and attach its tags in one transaction.
    ///
    /// `tags` pairs a fresh id with each tag text; the id is only used when
    /// the tag does not exist yet.
    pub async fn create_with_tags(
        &self,
        model: question::ActiveModel,
        tags: &[(String, String)],
    ) -> AppResult<(question::Model, Vec<tag::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match Self::insert_tagged(&txn, model, tags).await {
            Ok(created) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(created)
            }
            Err(e) => {
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Err(e)
            }
        }
    }

    async fn insert_tagged(
        txn: &DatabaseTransaction,
        model: question::ActiveModel,
        tags: &[(String, String)],
    ) -> AppResult<(question::Model, Vec<tag::Model>)> {
        let question = model
            .insert(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut attached = Vec::with_capacity(tags.len());
        for (id, text) in tags {
            let tag = TagRepository::get_or_create_in(txn, id, text).await?;
            TagRepository::attach_in(txn, &question.id, &tag.id).await?;
            attached.push(tag);
        }

        Ok((question, attached))
    }

    /// One question with author and aggregates.
    pub async fn find_summary(&self, id: &str) -> AppResult<Option<QuestionSummary>> {
        let mut rows = self
            .find_summaries(QuestionFilter::Id(id), ListOrder::New, 1, 0)
            .await?;
        Ok(rows.pop())
    }

    /// A page of question summaries.
    pub async fn find_summaries(
        &self,
        filter: QuestionFilter<'_>,
        order: ListOrder,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<QuestionSummary>> {
        let (where_clause, mut values) = filter.where_clause();
        let limit_idx = values.len() + 1;
        let offset_idx = values.len() + 2;
        let sql = format!(
            "{} WHERE {where_clause} ORDER BY {} LIMIT ${limit_idx} OFFSET ${offset_idx}",
            summary_select(),
            order.order_by_clause("q")
        );
        values.push((limit as i64).into());
        values.push((offset as i64).into());

        QuestionSummary::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &sql,
            values,
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of questions matching the filter.
    pub async fn count(&self, filter: QuestionFilter<'_>) -> AppResult<u64> {
        let (where_clause, values) = filter.where_clause();
        let sql = format!("SELECT COUNT(*)::bigint AS total FROM question q WHERE {where_clause}");

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                values,
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let total = match row {
            Some(row) => row
                .try_get::<i64>("", "total")
                .map_err(|e| AppError::Database(e.to_string()))?,
            None => 0,
        };
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
