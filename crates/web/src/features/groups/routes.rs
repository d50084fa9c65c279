use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{
    check_access, create_group, delete_group, get_group, list_groups, update_group,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route(
            "/:slug",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/:slug/access/:resource", post(check_access))
}
