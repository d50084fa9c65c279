use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use storage::{dto::score::SubmitScoreRequest, models::Score};

use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::middleware::auth::CallerContext;
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/api/groups/{slug}/scores",
    params(
        ("slug" = String, Path, description = "Group slug"),
        ("x-user-id" = String, Header, description = "Judge user id"),
        ("x-access-password" = Option<String>, Header, description = "Judge interface password")
    ),
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score recorded, replacing any earlier rating", body = Score),
        (status = 400, description = "Rating outside the group's scale"),
        (status = 401, description = "Missing identity or invalid credential"),
        (status = 404, description = "Group, criterion or submission not found"),
        (status = 409, description = "Group closed for judging")
    ),
    tag = "scores"
)]
pub async fn submit_score(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
    JsonBody(req): JsonBody<SubmitScoreRequest>,
) -> ApiResult<Json<Score>> {
    let score = state
        .service
        .submit_score(&ctx.caller, &slug, ctx.password(), req, Utc::now())
        .await?;

    Ok(Json(score))
}

#[utoipa::path(
    get,
    path = "/api/groups/{slug}/scores/mine",
    params(
        ("slug" = String, Path, description = "Group slug"),
        ("x-user-id" = String, Header, description = "Judge user id"),
        ("x-access-password" = Option<String>, Header, description = "Judge interface password")
    ),
    responses(
        (status = 200, description = "The calling judge's scores", body = Vec<Score>),
        (status = 401, description = "Missing identity or invalid credential"),
        (status = 404, description = "Group not found")
    ),
    tag = "scores"
)]
pub async fn my_scores(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
) -> ApiResult<Json<Vec<Score>>> {
    let scores = state
        .service
        .my_scores(&ctx.caller, &slug, ctx.password())
        .await?;

    Ok(Json(scores))
}
