use axum::{Router, routing::get};

use super::handlers::{list_criteria, save_criteria};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:slug/criteria", get(list_criteria).put(save_criteria))
}
