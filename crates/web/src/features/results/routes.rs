use axum::{Router, routing::get};

use super::handlers::{export_results, get_judge_breakdown, get_results};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:slug/results", get(get_results))
        .route("/:slug/results/judges", get(get_judge_breakdown))
        .route("/:slug/results/export", get(export_results))
}
