mod memory;
mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Criterion, JudgingGroup, Score, Submission};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A validated criterion ready to be written by a whole-set replace
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionDraft {
    pub criterion_id: Option<Uuid>,
    pub question: String,
    pub description: Option<String>,
    pub weight: Decimal,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpsert {
    pub group_id: Uuid,
    pub judge_id: Uuid,
    pub submission_id: Uuid,
    pub criterion_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

/// Owns groups, criteria and scores
#[async_trait]
pub trait JudgingStore: Send + Sync {
    async fn list_groups(&self, offset: i64, limit: i64) -> Result<(Vec<JudgingGroup>, i64)>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<JudgingGroup>;

    async fn insert_group(&self, group: &JudgingGroup) -> Result<JudgingGroup>;

    async fn update_group(&self, group: &JudgingGroup) -> Result<JudgingGroup>;

    /// Removes the group, its criteria and its scores atomically
    async fn delete_group(&self, group_id: Uuid) -> Result<()>;

    async fn list_criteria(&self, group_id: Uuid) -> Result<Vec<Criterion>>;

    /// Atomically replaces the group's criteria set with `drafts`
    async fn replace_criteria(
        &self,
        group_id: Uuid,
        drafts: &[CriterionDraft],
    ) -> Result<Vec<Criterion>>;

    async fn upsert_score(&self, score: &ScoreUpsert) -> Result<Score>;

    async fn list_scores(&self, group_id: Uuid) -> Result<Vec<Score>>;

    async fn list_judge_scores(&self, group_id: Uuid, judge_id: Uuid) -> Result<Vec<Score>>;

    async fn count_scores(&self, group_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait SubmissionDirectory: Send + Sync {
    async fn list_submissions(&self, group_id: Uuid) -> Result<Vec<Submission>>;

    async fn find_submission(&self, submission_id: Uuid) -> Result<Submission>;
}

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Display name for `user_id`, or `None` when the user is unknown
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>>;
}

#[async_trait]
pub trait AdminAuthority: Send + Sync {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool>;
}
