//! Answer service: posting answers and marking the accepted one.

use hasker_common::{AppError, AppResult, IdGenerator};
use hasker_db::{
    entities::{answer, user},
    repositories::{AnswerRepository, QuestionRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::mail::{MailMessage, MailService};

/// Input for answering a question.
#[derive(Debug, Deserialize, Validate)]
pub struct PostAnswerInput {
    #[validate(length(min = 1, max = 2048))]
    pub text: String,
}

/// Answer service for business logic.
#[derive(Clone)]
pub struct AnswerService {
    answer_repo: AnswerRepository,
    question_repo: QuestionRepository,
    user_repo: UserRepository,
    mailer: MailService,
    id_gen: IdGenerator,
    server_url: String,
}

impl AnswerService {
    /// Create a new answer service.
    #[must_use]
    pub fn new(
        answer_repo: AnswerRepository,
        question_repo: QuestionRepository,
        user_repo: UserRepository,
        mailer: MailService,
        server_url: &str,
    ) -> Self {
        Self {
            answer_repo,
            question_repo,
            user_repo,
            mailer,
            id_gen: IdGenerator::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public link to a question page.
    #[must_use]
    pub fn question_url(&self, question_id: &str) -> String {
        format!("{}/hasker/question/{question_id}/", self.server_url)
    }

    /// Answer a question and tell its author.
    ///
    /// The notice is only sent when the author has an e-mail address. A
    /// failed delivery is logged; the answer is kept either way.
    pub async fn post_answer(
        &self,
        author: &user::Model,
        question_id: &str,
        input: PostAnswerInput,
    ) -> AppResult<answer::Model> {
        input.validate()?;
        let question = self.question_repo.get_by_id(question_id).await?;

        let model = answer::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(input.text),
            correct: Set(false),
            author_id: Set(author.id.clone()),
            question_id: Set(question.id.clone()),
            creation_date: Set(chrono::Utc::now().into()),
        };
        let created = self.answer_repo.create(model).await?;
        info!(answer_id = %created.id, question_id = %question.id, "Answer posted");

        let question_author = self.user_repo.find_by_id(&question.author_id).await?;
        if let Some(to) = question_author.and_then(|u| u.email).filter(|e| !e.is_empty()) {
            let message = MailMessage::answer_notification(
                &to,
                &self.question_url(&question.id),
                &question.text,
                &author.username,
                &created.text,
            );
            if let Err(e) = self.mailer.send(message).await {
                warn!(error = %e, question_id = %question.id, "Failed to send answer notification");
            }
        }

        Ok(created)
    }

    /// Set or clear the accepted answer.
    ///
    /// Only the question's author may do this; anyone else, signed in or
    /// not, gets `Forbidden` and nothing changes.
    pub async fn set_solution(
        &self,
        user_id: Option<&str>,
        answer_id: &str,
        flag: bool,
    ) -> AppResult<()> {
        let answer = self.answer_repo.get_by_id(answer_id).await?;
        let question = self.question_repo.get_by_id(&answer.question_id).await?;

        if user_id != Some(question.author_id.as_str()) {
            return Err(AppError::Forbidden(
                "Only the question author can choose the solution".to_string(),
            ));
        }

        if flag {
            self.answer_repo
                .mark_solution(&question.id, &answer.id)
                .await?;
        } else {
            self.answer_repo.clear_solution(&answer.id).await?;
        }

        info!(answer_id = %answer.id, question_id = %question.id, flag, "Solution updated");
        Ok(())
    }
}
