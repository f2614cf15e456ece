//! Answer repository.

use std::sync::Arc;

use crate::entities::{Answer, answer};
use crate::repositories::ordering::{ListOrder, RankKey};
use hasker_common::{AppError, AppResult, DEFAULT_AVATAR_URL};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, Statement,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;

/// An answer row with its author and vote total.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSummary {
    pub id: String,
    pub text: String,
    pub correct: bool,
    pub question_id: String,
    pub author_id: String,
    pub author_username: String,
    /// Uploaded avatar, or the default one.
    pub author_avatar_url: String,
    pub creation_date: DateTimeWithTimeZone,
    pub votes: i64,
}

impl AnswerSummary {
    #[must_use]
    pub fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            votes: self.votes,
            creation_date: self.creation_date,
            id: &self.id,
        }
    }
}

/// Every answer to the question gets `correct = (id = answer)`, so exactly
/// one of them ends up marked.
const MARK_SOLUTION_SQL: &str = "UPDATE answer SET correct = (id = $1) WHERE question_id = $2";

const CLEAR_SOLUTION_SQL: &str = "UPDATE answer SET correct = FALSE WHERE id = $1";

/// Answer repository for database operations.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an answer by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an answer by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<answer::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(id.to_string()))
    }

    /// Create a new answer.
    pub async fn create(&self, model: answer::ActiveModel) -> AppResult<answer::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of answers to a question.
    pub async fn count_by_question(&self, question_id: &str) -> AppResult<u64> {
        Answer::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A page of answers to a question with authors and vote totals.
    pub async fn find_summaries(
        &self,
        question_id: &str,
        order: ListOrder,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<AnswerSummary>> {
        let sql = format!(
            r#"
            SELECT
                a.id, a.text, a.correct, a.question_id, a.author_id,
                u.username AS author_username,
                COALESCE(p.avatar_url, '{DEFAULT_AVATAR_URL}') AS author_avatar_url,
                a.creation_date,
                COALESCE(v.votes, 0)::bigint AS votes
            FROM answer a
            JOIN "user" u ON u.id = a.author_id
            LEFT JOIN user_profile p ON p.user_id = a.author_id
            LEFT JOIN (
                SELECT answer_id, SUM(vote) AS votes FROM answer_vote GROUP BY answer_id
            ) v ON v.answer_id = a.id
            WHERE a.question_id = $1
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order.order_by_clause("a")
        );

        AnswerSummary::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &sql,
            [
                question_id.into(),
                (limit as i64).into(),
                (offset as i64).into(),
            ],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark `answer_id` as the solution of `question_id` and unmark every
    /// other answer to it, in one statement.
    pub async fn mark_solution(&self, question_id: &str, answer_id: &str) -> AppResult<u64> {
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                MARK_SOLUTION_SQL,
                [answer_id.into(), question_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Unmark a single answer.
    pub async fn clear_solution(&self, answer_id: &str) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                CLEAR_SOLUTION_SQL,
                [answer_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{MockDatabase, MockExecResult, Transaction, Value};

    fn create_test_answer(id: &str, question_id: &str, correct: bool) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            text: "Use a borrow.".to_string(),
            correct,
            author_id: "user2".to_string(),
            question_id: question_id.to_string(),
            creation_date: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<answer::Model>::new()])
                .into_connection(),
        );

        let repo = AnswerRepository::new(db);
        let result = repo.get_by_id("a404").await;

        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let answer = create_test_answer("a1", "q1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[answer]])
                .into_connection(),
        );

        let repo = AnswerRepository::new(db);
        let found = repo.find_by_id("a1").await.unwrap().unwrap();

        assert!(found.correct);
        assert_eq!(found.question_id, "q1");
    }

    #[tokio::test]
    async fn test_find_summaries() {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "id" => Value::from("a1"),
                    "text" => Value::from("Answer"),
                    "correct" => Value::from(true),
                    "question_id" => Value::from("q1"),
                    "author_id" => Value::from("user2"),
                    "author_username" => Value::from("bob"),
                    "author_avatar_url" => Value::from("/media/avatars/bob.png"),
                    "creation_date" => Value::from(now),
                    "votes" => Value::BigInt(Some(4)),
                }]])
                .into_connection(),
        );

        let repo = AnswerRepository::new(db);
        let rows = repo
            .find_summaries("q1", ListOrder::Hot, 25, 0)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].correct);
        assert_eq!(rows[0].votes, 4);
        assert_eq!(rows[0].author_username, "bob");
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_mark_solution_updates_whole_question() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_ok(3)])
                .into_connection(),
        );

        let repo = AnswerRepository::new(db);
        let affected = repo.mark_solution("q1", "a2").await.unwrap();

        assert_eq!(affected, 3);
    }

    #[tokio::test]
    async fn test_marking_second_answer_moves_the_solution() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_ok(2), exec_ok(2)])
                .into_connection(),
        );

        let repo = AnswerRepository::new(Arc::clone(&db));
        repo.mark_solution("q1", "a1").await.unwrap();
        repo.mark_solution("q1", "a2").await.unwrap();

        drop(repo);
        let mark = |answer_id: &str| {
            Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "UPDATE answer SET correct = (id = $1) WHERE question_id = $2",
                [answer_id.into(), "q1".into()],
            )
        };
        assert_eq!(
            Arc::try_unwrap(db).unwrap().into_transaction_log(),
            [mark("a1"), mark("a2")]
        );
    }

    #[tokio::test]
    async fn test_clear_solution() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_ok(1)])
                .into_connection(),
        );

        let repo = AnswerRepository::new(Arc::clone(&db));
        assert!(repo.clear_solution("a1").await.is_ok());

        drop(repo);
        assert_eq!(
            Arc::try_unwrap(db).unwrap().into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                "UPDATE answer SET correct = FALSE WHERE id = $1",
                ["a1".into()],
            )]
        );
    }
}
