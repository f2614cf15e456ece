//! Accepted-answer endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};
use hasker_common::AppResult;

use crate::{extractors::MaybeAuthUser, middleware::AppState, response};

async fn set(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(answer_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .answer_service
        .set_solution(user.as_ref().map(|u| u.id.as_str()), &answer_id, true)
        .await?;
    Ok(response::ok())
}

async fn clear(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(answer_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .answer_service
        .set_solution(user.as_ref().map(|u| u.id.as_str()), &answer_id, false)
        .await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hasker/question/solution-set/{answer_id}/", post(set))
        .route("/hasker/question/solution-clear/{answer_id}/", post(clear))
}
