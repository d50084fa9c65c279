use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One rating question judges answer for every submission of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Criterion {
    pub criterion_id: Uuid,
    pub group_id: Uuid,
    pub question: String,
    pub description: Option<String>,
    pub weight: Decimal,
    /// Dense, zero-based display position within the group
    #[sqlx(rename = "position")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
}
