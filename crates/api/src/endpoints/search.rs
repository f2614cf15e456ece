//! Search, tag listing and trending.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use hasker_common::AppResult;
use hasker_core::{Page, PageNumber, QuestionListItem, SearchQuery};
use serde::Deserialize;

use crate::{middleware::AppState, response};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagParams {
    pub page: Option<String>,
}

/// Text search. `tag:<name>` redirects to the tag listing.
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    match SearchQuery::parse(&params.q) {
        SearchQuery::Tag(tag) => Ok(response::found(&format!(
            "/hasker/tag/{}/",
            urlencoding::encode(&tag)
        ))),
        SearchQuery::Text(q) => {
            let page = PageNumber::parse(params.page.as_deref())?;
            let results = state.question_service.search_text(&q, page).await?;
            Ok(Json(results).into_response())
        }
    }
}

/// Questions carrying a tag.
async fn by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(params): Query<TagParams>,
) -> AppResult<Json<Page<QuestionListItem>>> {
    let page = PageNumber::parse(params.page.as_deref())?;
    let results = state.question_service.search_tag(&tag, page).await?;
    Ok(Json(results))
}

/// The hottest questions.
async fn trending(State(state): State<AppState>) -> AppResult<Json<Vec<QuestionListItem>>> {
    Ok(Json(state.question_service.trending().await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hasker/search/", get(search))
        .route("/hasker/tag/{tag}/", get(by_tag))
        .route("/hasker/trending/", get(trending))
}
