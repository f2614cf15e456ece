//! Question endpoints: index, detail, answering and asking.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use hasker_common::AppResult;
use hasker_core::{
    AskQuestionInput, Page, PageNumber, PostAnswerInput, QuestionDetail, QuestionListItem,
};
use hasker_db::repositories::ListOrder;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState};

/// Query string of paged listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> AppResult<PageNumber> {
        PageNumber::parse(self.page.as_deref())
    }
}

/// Created question.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: String,
    pub title: String,
    pub text: String,
    pub author_id: String,
    pub creation_date: String,
}

/// Created answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: String,
    pub question_id: String,
    pub author_id: String,
    pub text: String,
    pub correct: bool,
    pub creation_date: String,
}

/// Data for the ask form.
#[derive(Debug, Serialize)]
pub struct AskFormResponse {
    pub tags: Vec<String>,
}

/// Question index, newest first unless `sort=hot`.
async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<QuestionListItem>>> {
    let order = ListOrder::from_query(query.sort.as_deref());
    let page = state.question_service.list(order, query.page()?).await?;
    Ok(Json(page))
}

/// Question with a page of answers.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<QuestionDetail>> {
    let detail = state.question_service.detail(&id, query.page()?).await?;
    Ok(Json(detail))
}

/// Answer a question.
async fn answer(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PostAnswerInput>,
) -> AppResult<(StatusCode, Json<AnswerResponse>)> {
    let answer = state.answer_service.post_answer(&user, &id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(AnswerResponse {
            id: answer.id,
            question_id: answer.question_id,
            author_id: answer.author_id,
            text: answer.text,
            correct: answer.correct,
            creation_date: answer.creation_date.to_rfc3339(),
        }),
    ))
}

/// Tags to choose from when asking.
async fn ask_form(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<AskFormResponse>> {
    let tags = state.question_service.all_tags().await?;
    Ok(Json(AskFormResponse {
        tags: tags.into_iter().map(|t| t.text).collect(),
    }))
}

/// Ask a question.
async fn ask(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AskQuestionInput>,
) -> AppResult<(StatusCode, Json<QuestionResponse>)> {
    let question = state.question_service.ask(&user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(QuestionResponse {
            id: question.id,
            title: question.title,
            text: question.text,
            author_id: question.author_id,
            creation_date: question.creation_date.to_rfc3339(),
        }),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hasker/", get(index))
        .route("/hasker/question/ask/", get(ask_form).post(ask))
        .route("/hasker/question/{id}/", get(detail).post(answer))
}
