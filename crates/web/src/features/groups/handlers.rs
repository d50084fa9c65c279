use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::{
        common::{PaginatedResponse, PaginationParams},
        group::{CreateGroupRequest, GroupResponse, UpdateGroupRequest},
    },
    services::{AccessDecision, GatedResource},
};

use crate::error::{ApiResult, WebError};
use crate::extract::JsonBody;
use crate::middleware::auth::CallerContext;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/groups",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Judging groups, newest first", body = PaginatedResponse<GroupResponse>),
        (status = 400, description = "Invalid pagination"),
        (status = 403, description = "Admin required")
    ),
    tag = "groups"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    ctx: CallerContext,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<PaginatedResponse<GroupResponse>>> {
    params.validate().map_err(WebError::BadRequest)?;

    let (groups, total) = state.service.list_groups(&ctx.caller, params).await?;
    let data = groups.into_iter().map(GroupResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, params, total)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{slug}",
    params(
        ("slug" = String, Path, description = "Group slug")
    ),
    responses(
        (status = 200, description = "Group found", body = GroupResponse),
        (status = 404, description = "Group not found")
    ),
    tag = "groups"
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<GroupResponse>> {
    let group = state.service.get_group(&slug).await?;

    Ok(Json(GroupResponse::from(group)))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Group created successfully", body = GroupResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin required"),
        (status = 409, description = "Slug already exists")
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    ctx: CallerContext,
    JsonBody(req): JsonBody<CreateGroupRequest>,
) -> ApiResult<Response> {
    let group = state.service.create_group(&ctx.caller, req).await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/groups/{slug}",
    params(
        ("slug" = String, Path, description = "Group slug")
    ),
    request_body = UpdateGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Group updated successfully", body = GroupResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "Group not found"),
        (status = 409, description = "Scoring scale locked by existing scores")
    ),
    tag = "groups"
)]
pub async fn update_group(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
    JsonBody(req): JsonBody<UpdateGroupRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let group = state.service.update_group(&ctx.caller, &slug, req).await?;

    Ok(Json(GroupResponse::from(group)))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{slug}",
    params(
        ("slug" = String, Path, description = "Group slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Group, criteria and scores deleted"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "Group not found")
    ),
    tag = "groups"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_group(&ctx.caller, &slug).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/groups/{slug}/access/{resource}",
    params(
        ("slug" = String, Path, description = "Group slug"),
        ("resource" = GatedResource, Path, description = "Gated resource to unlock"),
        ("x-access-password" = Option<String>, Header, description = "Password for the resource")
    ),
    responses(
        (status = 200, description = "Access decision", body = AccessDecision),
        (status = 404, description = "Group not found")
    ),
    tag = "groups"
)]
pub async fn check_access(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path((slug, resource)): Path<(String, GatedResource)>,
) -> ApiResult<Json<AccessDecision>> {
    let decision = state
        .service
        .check_access(&ctx.caller, &slug, resource, ctx.password())
        .await?;

    Ok(Json(decision))
}
