use axum::{
    Json,
    extract::{Path, State},
};
use storage::{dto::criterion::SaveCriteriaRequest, models::Criterion};

use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::middleware::auth::CallerContext;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/groups/{slug}/criteria",
    params(
        ("slug" = String, Path, description = "Group slug"),
        ("x-access-password" = Option<String>, Header, description = "Judge interface password")
    ),
    responses(
        (status = 200, description = "Criteria in display order", body = Vec<Criterion>),
        (status = 401, description = "Invalid credential"),
        (status = 404, description = "Group not found")
    ),
    tag = "criteria"
)]
pub async fn list_criteria(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
) -> ApiResult<Json<Vec<Criterion>>> {
    let criteria = state
        .service
        .list_criteria(&ctx.caller, &slug, ctx.password())
        .await?;

    Ok(Json(criteria))
}

#[utoipa::path(
    put,
    path = "/api/groups/{slug}/criteria",
    params(
        ("slug" = String, Path, description = "Group slug")
    ),
    request_body = SaveCriteriaRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Criteria set replaced", body = Vec<Criterion>),
        (status = 400, description = "Validation error, nothing was written"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "Group not found")
    ),
    tag = "criteria"
)]
pub async fn save_criteria(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
    JsonBody(req): JsonBody<SaveCriteriaRequest>,
) -> ApiResult<Json<Vec<Criterion>>> {
    let criteria = state
        .service
        .save_criteria(&ctx.caller, &slug, &req.criteria)
        .await?;

    Ok(Json(criteria))
}
