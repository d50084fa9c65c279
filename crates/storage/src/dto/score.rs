use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitScoreRequest {
    pub submission_id: Uuid,
    pub criterion_id: Uuid,
    /// Checked against the group's scale; wider than a stored rating so
    /// out-of-range values still reach that check
    pub rating: i64,
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}
