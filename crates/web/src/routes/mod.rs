use axum::Router;

use crate::features::{criteria, groups, results, scores};
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    let groups = groups::routes::routes()
        .merge(criteria::routes::routes())
        .merge(scores::routes::routes())
        .merge(results::routes::routes());

    Router::new().nest("/api/groups", groups).with_state(state)
}
