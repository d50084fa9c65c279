use std::io;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use futures::stream;
use storage::{
    dto::results::{GroupResultsResponse, JudgeBreakdownResponse},
    services::export,
};
use tokio::sync::mpsc;

use crate::error::{ApiResult, WebError};
use crate::middleware::auth::CallerContext;
use crate::state::AppState;

const EXPORT_CHANNEL_CAPACITY: usize = 16;

#[utoipa::path(
    get,
    path = "/api/groups/{slug}/results",
    params(
        ("slug" = String, Path, description = "Group slug"),
        ("x-access-password" = Option<String>, Header, description = "Results page password")
    ),
    responses(
        (status = 200, description = "Ranked results, recomputed on every request", body = GroupResultsResponse),
        (status = 401, description = "Invalid credential"),
        (status = 404, description = "Group not found")
    ),
    tag = "results"
)]
pub async fn get_results(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
) -> ApiResult<Json<GroupResultsResponse>> {
    let results = state
        .service
        .get_group_results(&ctx.caller, &slug, ctx.password())
        .await?;

    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/groups/{slug}/results/judges",
    params(
        ("slug" = String, Path, description = "Group slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Per-judge activity", body = JudgeBreakdownResponse),
        (status = 403, description = "Admin required"),
        (status = 404, description = "Group not found")
    ),
    tag = "results"
)]
pub async fn get_judge_breakdown(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
) -> ApiResult<Json<JudgeBreakdownResponse>> {
    let breakdown = state
        .service
        .get_judge_breakdown(&ctx.caller, &slug)
        .await?;

    Ok(Json(breakdown))
}

#[utoipa::path(
    get,
    path = "/api/groups/{slug}/results/export",
    params(
        ("slug" = String, Path, description = "Group slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "One CSV row per rating", content_type = "text/csv", body = String),
        (status = 403, description = "Admin required"),
        (status = 404, description = "Group not found")
    ),
    tag = "results"
)]
pub async fn export_results(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    let (group, snapshot) = state.service.export_snapshot(&ctx.caller, &slug).await?;

    let (tx, rx) = mpsc::channel(EXPORT_CHANNEL_CAPACITY);
    let export_slug = group.slug.clone();
    tokio::task::spawn_blocking(move || {
        match export::write_csv(&snapshot, ChannelWriter { tx }) {
            Ok(rows) => tracing::info!(group = %export_slug, rows, "Results exported"),
            Err(e) => tracing::warn!(group = %export_slug, "Results export aborted: {}", e),
        }
    });

    let body = Body::from_stream(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    }));

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}-results.csv\"",
        group.slug
    ))
    .map_err(|e| WebError::InternalServerError(e.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Blocking writer that forwards each chunk to the response body stream
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
