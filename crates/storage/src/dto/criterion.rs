use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One entry of a proposed criteria set. Entries carrying a `criterion_id`
/// update that criterion in place; entries without one are inserted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CriterionInput {
    pub criterion_id: Option<Uuid>,
    pub question: String,
    pub description: Option<String>,
    pub weight: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SaveCriteriaRequest {
    pub criteria: Vec<CriterionInput>,
}
