//! Vote endpoints.
//!
//! Anonymous voters get 403, matching the solution endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use hasker_common::AppResult;
use hasker_core::VoteDirection;
use hasker_db::repositories::VoteKind;

use crate::{extractors::MaybeAuthUser, middleware::AppState, response::VotesResponse};

async fn vote(
    state: &AppState,
    user: MaybeAuthUser,
    kind: VoteKind,
    id: &str,
    direction: VoteDirection,
) -> AppResult<Json<VotesResponse>> {
    let user = user.require("vote")?;
    let votes = state
        .vote_service
        .apply_vote(&user.id, kind, id, direction)
        .await?;
    Ok(Json(VotesResponse { votes }))
}

async fn question_up(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VotesResponse>> {
    vote(&state, user, VoteKind::Question, &id, VoteDirection::Up).await
}

async fn question_down(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VotesResponse>> {
    vote(&state, user, VoteKind::Question, &id, VoteDirection::Down).await
}

async fn answer_up(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VotesResponse>> {
    vote(&state, user, VoteKind::Answer, &id, VoteDirection::Up).await
}

async fn answer_down(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VotesResponse>> {
    vote(&state, user, VoteKind::Answer, &id, VoteDirection::Down).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hasker/question/{id}/vote-up/", post(question_up))
        .route("/hasker/question/{id}/vote-down/", post(question_down))
        .route("/hasker/answer/{id}/vote-up/", post(answer_up))
        .route("/hasker/answer/{id}/vote-down/", post(answer_down))
}
