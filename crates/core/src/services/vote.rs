//! Vote service.
//!
//! A user's vote on a question or answer is a ratchet over -1, 0 and +1:
//! up moves it one step towards +1, down one step towards -1, and a step
//! past either end is refused without touching the ledger.

use hasker_common::{AppError, AppResult, IdGenerator};
use hasker_db::repositories::{
    AnswerRepository, QuestionRepository, VoteKind, VoteOutcome, VoteRepository,
};
use serde::Deserialize;
use tracing::debug;

/// Direction of a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    #[must_use]
    pub const fn delta(self) -> i16 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// A ledger value. Only -1, 0 and +1 are representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoteValue(i16);

impl VoteValue {
    pub const DOWN: Self = Self(-1);
    pub const NEUTRAL: Self = Self(0);
    pub const UP: Self = Self(1);

    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }

    /// The value after one step in `direction`, or `None` if that leaves the range.
    #[must_use]
    pub fn step(self, direction: VoteDirection) -> Option<Self> {
        Self::try_from(self.0 + direction.delta()).ok()
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        if (-1..=1).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::VoteOutOfRange)
        }
    }
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(
        vote_repo: VoteRepository,
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
    ) -> Self {
        Self {
            vote_repo,
            question_repo,
            answer_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Apply one vote step and return the target's new total.
    ///
    /// Fails with `VoteOutOfRange` when the user's value is already at the
    /// end of the range in `direction`; the ledger and total are unchanged.
    pub async fn apply_vote(
        &self,
        user_id: &str,
        kind: VoteKind,
        target_id: &str,
        direction: VoteDirection,
    ) -> AppResult<i64> {
        self.ensure_target_exists(kind, target_id).await?;

        let record_id = self.id_gen.generate();
        let outcome = self
            .vote_repo
            .apply(kind, &record_id, user_id, target_id, |current| {
                VoteValue::try_from(current)
                    .ok()?
                    .step(direction)
                    .map(VoteValue::get)
            })
            .await?;

        match outcome {
            VoteOutcome::Applied { previous, value } => {
                debug!(
                    user_id = %user_id,
                    target_id = %target_id,
                    kind = ?kind,
                    previous,
                    value,
                    "Vote applied"
                );
                self.vote_repo.total(kind, target_id).await
            }
            VoteOutcome::Rejected { current } => {
                debug!(
                    user_id = %user_id,
                    target_id = %target_id,
                    kind = ?kind,
                    current,
                    "Vote rejected"
                );
                Err(AppError::VoteOutOfRange)
            }
        }
    }

    async fn ensure_target_exists(&self, kind: VoteKind, target_id: &str) -> AppResult<()> {
        match kind {
            VoteKind::Question => {
                self.question_repo.get_by_id(target_id).await?;
            }
            VoteKind::Answer => {
                self.answer_repo.get_by_id(target_id).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hasker_db::entities::{answer, question};
    use proptest::prelude::*;
    use sea_orm::{
        DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Statement, Transaction,
        Value,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn test_question(id: &str) -> question::Model {
        question::Model {
            id: id.to_string(),
            title: "How do lifetimes work?".to_string(),
            text: "Body".to_string(),
            author_id: "author".to_string(),
            creation_date: Utc::now().into(),
        }
    }

    fn test_answer(id: &str) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            text: "Like this".to_string(),
            correct: false,
            author_id: "author".to_string(),
            question_id: "q1".to_string(),
            creation_date: Utc::now().into(),
        }
    }

    fn vote_row(vote: i16) -> BTreeMap<&'static str, Value> {
        maplit::btreemap! { "vote" => Value::SmallInt(Some(vote)) }
    }

    fn total_row(total: i64) -> BTreeMap<&'static str, Value> {
        maplit::btreemap! { "total" => Value::BigInt(Some(total)) }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn empty() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(
        vote_db: Arc<DatabaseConnection>,
        question_db: Arc<DatabaseConnection>,
        answer_db: Arc<DatabaseConnection>,
    ) -> VoteService {
        VoteService::new(
            VoteRepository::new(vote_db),
            QuestionRepository::new(question_db),
            AnswerRepository::new(answer_db),
        )
    }

    #[test]
    fn test_ratchet_up() {
        let v = VoteValue::NEUTRAL;
        let v = v.step(VoteDirection::Up).unwrap();
        assert_eq!(v, VoteValue::UP);
        assert_eq!(v.step(VoteDirection::Up), None);
        assert_eq!(v.step(VoteDirection::Down), Some(VoteValue::NEUTRAL));
    }

    #[test]
    fn test_ratchet_down() {
        let v = VoteValue::NEUTRAL.step(VoteDirection::Down).unwrap();
        assert_eq!(v, VoteValue::DOWN);
        assert_eq!(v.step(VoteDirection::Down), None);
    }

    #[test]
    fn test_try_from_rejects_out_of_range() {
        assert!(VoteValue::try_from(2).is_err());
        assert!(VoteValue::try_from(-2).is_err());
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::DOWN);
    }

    proptest! {
        #[test]
        fn prop_value_stays_in_range(ups in prop::collection::vec(any::<bool>(), 0..64)) {
            let mut value = VoteValue::default();
            for up in ups {
                let direction = if up { VoteDirection::Up } else { VoteDirection::Down };
                if let Some(next) = value.step(direction) {
                    prop_assert_eq!(next.get() - value.get(), direction.delta());
                    value = next;
                } else {
                    prop_assert_eq!(value.get(), direction.delta());
                }
                prop_assert!((-1..=1).contains(&value.get()));
            }
        }

        #[test]
        fn prop_up_then_down_is_identity(start in -1i16..=0) {
            let value = VoteValue::try_from(start).unwrap();
            let back = value
                .step(VoteDirection::Up)
                .and_then(|v| v.step(VoteDirection::Down));
            prop_assert_eq!(back, Some(value));
        }
    }

    #[tokio::test]
    async fn test_apply_vote_first_up_returns_total() {
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
                .append_exec_results([exec_ok()])
                .append_query_results([[total_row(1)]])
                .into_connection(),
        );
        let question_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_question("q1")]])
                .into_connection(),
        );

        let svc = service(vote_db, question_db, empty());
        let total = svc
            .apply_vote("user1", VoteKind::Question, "q1", VoteDirection::Up)
            .await
            .unwrap();

        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_apply_vote_second_up_is_out_of_range() {
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote_row(1)]])
                .into_connection(),
        );
        let answer_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_answer("a1")]])
                .into_connection(),
        );

        let svc = service(vote_db, empty(), answer_db);
        let result = svc
            .apply_vote("user1", VoteKind::Answer, "a1", VoteDirection::Up)
            .await;

        assert!(matches!(result, Err(AppError::VoteOutOfRange)));
    }

    #[tokio::test]
    async fn test_apply_vote_down_from_up_returns_to_neutral() {
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote_row(1)]])
                .append_exec_results([exec_ok()])
                .append_query_results([[total_row(0)]])
                .into_connection(),
        );
        let answer_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_answer("a1")]])
                .into_connection(),
        );

        let svc = service(vote_db, empty(), answer_db);
        let total = svc
            .apply_vote("user1", VoteKind::Answer, "a1", VoteDirection::Down)
            .await
            .unwrap();

        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_apply_vote_missing_question() {
        let question_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );

        let svc = service(empty(), question_db, empty());
        let result = svc
            .apply_vote("user1", VoteKind::Question, "q404", VoteDirection::Up)
            .await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_vote_missing_answer() {
        let answer_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<answer::Model>::new()])
                .into_connection(),
        );

        let svc = service(empty(), empty(), answer_db);
        let result = svc
            .apply_vote("user1", VoteKind::Answer, "a404", VoteDirection::Down)
            .await;

        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }

    #[tokio::test]
    async fn test_two_users_up_then_one_down() {
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![],
                    vec![total_row(1)],
                    vec![],
                    vec![total_row(2)],
                    vec![vote_row(1)],
                    vec![total_row(1)],
                ])
                .append_exec_results([exec_ok(), exec_ok(), exec_ok()])
                .into_connection(),
        );
        let question_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [test_question("q1")],
                    [test_question("q1")],
                    [test_question("q1")],
                ])
                .into_connection(),
        );

        let svc = service(Arc::clone(&vote_db), question_db, empty());
        let steps = [
            ("user1", VoteDirection::Up, 1),
            ("user2", VoteDirection::Up, 2),
            ("user1", VoteDirection::Down, 1),
        ];
        for (user, direction, expected) in steps {
            let total = svc
                .apply_vote(user, VoteKind::Question, "q1", direction)
                .await
                .unwrap();
            assert_eq!(total, expected, "{user} {direction:?}");
        }

        drop(svc);
        let log = Arc::try_unwrap(vote_db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 6, "one ledger transaction and one total per vote");
        assert_eq!(
            log[4],
            Transaction::many([
                Statement::from_string(DatabaseBackend::Postgres, "BEGIN"),
                Statement::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    "SELECT vote FROM question_vote WHERE user_id = $1 AND question_id = $2 FOR UPDATE",
                    ["user1".into(), "q1".into()],
                ),
                Statement::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    "UPDATE question_vote SET vote = $1 WHERE user_id = $2 AND question_id = $3",
                    [0i16.into(), "user1".into(), "q1".into()],
                ),
                Statement::from_string(DatabaseBackend::Postgres, "COMMIT"),
            ])
        );
    }
}
