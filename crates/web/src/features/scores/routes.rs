use axum::{
    Router,
    routing::{get, put},
};

use super::handlers::{my_scores, submit_score};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:slug/scores", put(submit_score))
        .route("/:slug/scores/mine", get(my_scores))
}
