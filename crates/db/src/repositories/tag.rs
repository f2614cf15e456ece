//! Tag repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{QuestionTag, Tag, question_tag, tag};
use hasker_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All tags, ordered by text.
    pub async fn find_all(&self) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .order_by_asc(tag::Column::Text)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Return the tag with this text, creating it with `id` if absent.
    ///
    /// Runs on `conn` so the caller can include it in a transaction.
    pub async fn get_or_create_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        text: &str,
    ) -> AppResult<tag::Model> {
        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO tag (id, text) VALUES ($1, $2) ON CONFLICT (text) DO NOTHING",
            [id.into(), text.into()],
        ))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Tag::find()
            .filter(tag::Column::Text.eq(text))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database(format!("tag {text} missing after upsert")))
    }

    /// Attach a tag to a question on `conn`. Attaching twice is a no-op.
    pub async fn attach_in<C: ConnectionTrait>(
        conn: &C,
        question_id: &str,
        tag_id: &str,
    ) -> AppResult<()> {
        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO question_tag (question_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
            [question_id.into(), tag_id.into()],
        ))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Tags of one question, ordered by text.
    pub async fn find_by_question(&self, question_id: &str) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .inner_join(QuestionTag)
            .filter(question_tag::Column::QuestionId.eq(question_id))
            .order_by_asc(tag::Column::Text)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tag texts for several questions at once, keyed by question id.
    pub async fn find_texts_by_questions(
        &self,
        question_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<String>>> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = QuestionTag::find()
            .find_also_related(Tag)
            .filter(question_tag::Column::QuestionId.is_in(question_ids.to_vec()))
            .order_by_asc(tag::Column::Text)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (link, tag) in rows {
            if let Some(tag) = tag {
                map.entry(link.question_id).or_default().push(tag.text);
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{MockDatabase, MockExecResult};

    fn create_test_tag(id: &str, text: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_tag("t1", "python"), create_test_tag("t2", "rust")]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let tags = repo.find_all().await.unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].text, "python");
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[create_test_tag("old", "rust")]])
                .into_connection(),
        );

        let tag = TagRepository::get_or_create_in(db.as_ref(), "new", "rust")
            .await
            .unwrap();

        assert_eq!(tag.id, "old");
    }

    #[tokio::test]
    async fn test_attach_ignores_existing_link() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        assert!(TagRepository::attach_in(db.as_ref(), "q1", "t1").await.is_ok());
    }

    #[tokio::test]
    async fn test_find_texts_by_questions_empty_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = TagRepository::new(db);
        let map = repo.find_texts_by_questions(&[]).await.unwrap();

        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_find_texts_by_questions_groups() {
        let link1 = question_tag::Model {
            question_id: "q1".to_string(),
            tag_id: "t1".to_string(),
        };
        let link2 = question_tag::Model {
            question_id: "q1".to_string(),
            tag_id: "t2".to_string(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    (link1, Some(create_test_tag("t1", "python"))),
                    (link2, Some(create_test_tag("t2", "rust"))),
                ]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let map = repo
            .find_texts_by_questions(&["q1".to_string()])
            .await
            .unwrap();

        assert_eq!(map["q1"], vec!["python".to_string(), "rust".to_string()]);
    }
}
