//! Question service: listing, detail, asking and search.

use hasker_common::{AppError, AppResult, IdGenerator, config::HaskerConfig};
use hasker_db::{
    entities::{question, tag},
    repositories::{
        AnswerRepository, AnswerSummary, ListOrder, QuestionFilter, QuestionRepository,
        QuestionSummary, TagRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::pagination::{Page, PageNumber, PageWindow};
use super::tag::parse_tags;

/// A question in a listing, with its tags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionListItem {
    #[serde(flatten)]
    pub question: QuestionSummary,
    pub tags: Vec<String>,
}

/// A question page: the question and one page of its answers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    pub question: QuestionListItem,
    pub answers: Page<AnswerSummary>,
}

/// Input for asking a question.
#[derive(Debug, Deserialize, Validate)]
pub struct AskQuestionInput {
    #[validate(length(min = 1, max = 128))]
    pub title: String,

    #[validate(length(min = 1, max = 2048))]
    pub text: String,

    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
}

/// How a search request is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Substring of title or body. Empty matches everything.
    Text(String),
    /// `tag:<name>`, answered by the tag listing.
    Tag(String),
}

impl SearchQuery {
    /// A `tag:` prefix with no tag after it is an empty text search.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix("tag:").map(str::trim) {
            Some(tag) if !tag.is_empty() => Self::Tag(tag.to_string()),
            Some(_) => Self::Text(String::new()),
            None => Self::Text(raw.to_string()),
        }
    }
}

/// Question service for business logic.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    tag_repo: TagRepository,
    id_gen: IdGenerator,
    question_page_size: u64,
    answer_page_size: u64,
    trending_size: u64,
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    pub fn new(
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        tag_repo: TagRepository,
        config: &HaskerConfig,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            tag_repo,
            id_gen: IdGenerator::new(),
            question_page_size: config.question_page_size,
            answer_page_size: config.answer_page_size,
            trending_size: config.trending_size,
        }
    }

    /// Index listing.
    pub async fn list(
        &self,
        order: ListOrder,
        page: PageNumber,
    ) -> AppResult<Page<QuestionListItem>> {
        self.paged(QuestionFilter::All, order, page).await
    }

    /// Questions whose title or body contains `q`, hottest first.
    pub async fn search_text(&self, q: &str, page: PageNumber) -> AppResult<Page<QuestionListItem>> {
        self.paged(QuestionFilter::Text(q.trim()), ListOrder::Hot, page)
            .await
    }

    /// Questions carrying `tag`, hottest first.
    pub async fn search_tag(&self, tag: &str, page: PageNumber) -> AppResult<Page<QuestionListItem>> {
        self.paged(QuestionFilter::Tag(tag), ListOrder::Hot, page)
            .await
    }

    /// The hottest few questions.
    pub async fn trending(&self) -> AppResult<Vec<QuestionListItem>> {
        let summaries = self
            .question_repo
            .find_summaries(QuestionFilter::All, ListOrder::Hot, self.trending_size, 0)
            .await?;
        self.with_tags(summaries).await
    }

    /// Every tag, for the ask form.
    pub async fn all_tags(&self) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.find_all().await
    }

    /// A question with one page of answers, best answers first.
    pub async fn detail(&self, id: &str, page: PageNumber) -> AppResult<QuestionDetail> {
        let summary = self
            .question_repo
            .find_summary(id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(id.to_string()))?;
        let tags = self
            .tag_repo
            .find_by_question(id)
            .await?
            .into_iter()
            .map(|t| t.text)
            .collect();

        let total = self.answer_repo.count_by_question(id).await?;
        let window = PageWindow::resolve(page, self.answer_page_size, total)?;
        let answers = self
            .answer_repo
            .find_summaries(id, ListOrder::Hot, window.limit(), window.offset())
            .await?;

        Ok(QuestionDetail {
            question: QuestionListItem {
                question: summary,
                tags,
            },
            answers: Page::new(answers, window),
        })
    }

    /// Post a new question. The question and its tags are written together.
    pub async fn ask(&self, author_id: &str, input: AskQuestionInput) -> AppResult<question::Model> {
        input.validate()?;
        let tags = parse_tags(&input.tags)?;
        let tag_rows: Vec<(String, String)> = tags
            .iter()
            .map(|text| (self.id_gen.generate(), text.clone()))
            .collect();

        let model = question::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            text: Set(input.text),
            author_id: Set(author_id.to_string()),
            creation_date: Set(chrono::Utc::now().into()),
        };
        let (created, _) = self
            .question_repo
            .create_with_tags(model, &tag_rows)
            .await?;

        info!(question_id = %created.id, author_id = %author_id, tags = ?tags, "Question asked");
        Ok(created)
    }

    async fn paged(
        &self,
        filter: QuestionFilter<'_>,
        order: ListOrder,
        page: PageNumber,
    ) -> AppResult<Page<QuestionListItem>> {
        let total = self.question_repo.count(filter).await?;
        let window = PageWindow::resolve(page, self.question_page_size, total)?;
        let summaries = self
            .question_repo
            .find_summaries(filter, order, window.limit(), window.offset())
            .await?;
        let items = self.with_tags(summaries).await?;
        Ok(Page::new(items, window))
    }

    async fn with_tags(&self, summaries: Vec<QuestionSummary>) -> AppResult<Vec<QuestionListItem>> {
        let ids: Vec<String> = summaries.iter().map(|q| q.id.clone()).collect();
        let mut tags = self.tag_repo.find_texts_by_questions(&ids).await?;
        Ok(summaries
            .into_iter()
            .map(|question| QuestionListItem {
                tags: tags.remove(&question.id).unwrap_or_default(),
                question,
            })
            .collect())
    }
}
