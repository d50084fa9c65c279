use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A judge's rating of one submission on one criterion.
///
/// Keyed by `(judge_id, submission_id, criterion_id)`; a resubmission
/// overwrites the rating and comment in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Score {
    pub score_id: Uuid,
    pub group_id: Uuid,
    pub judge_id: Uuid,
    pub submission_id: Uuid,
    pub criterion_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
