use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    AdminAuthority, CriterionDraft, IdentityLookup, JudgingStore, ScoreUpsert, SubmissionDirectory,
};
use crate::Database;
use crate::error::Result;
use crate::models::{Criterion, JudgingGroup, Score, Submission};
use crate::repository::{
    criterion::CriterionRepository, group::GroupRepository, score::ScoreRepository,
    submission::SubmissionRepository, user::UserRepository,
};

/// Postgres-backed implementation of every store trait
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl JudgingStore for PgStore {
    async fn list_groups(&self, offset: i64, limit: i64) -> Result<(Vec<JudgingGroup>, i64)> {
        GroupRepository::new(&self.pool).list(offset, limit).await
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<JudgingGroup> {
        GroupRepository::new(&self.pool).find_by_slug(slug).await
    }

    async fn insert_group(&self, group: &JudgingGroup) -> Result<JudgingGroup> {
        GroupRepository::new(&self.pool).create(group).await
    }

    async fn update_group(&self, group: &JudgingGroup) -> Result<JudgingGroup> {
        GroupRepository::new(&self.pool).update(group).await
    }

    async fn delete_group(&self, group_id: Uuid) -> Result<()> {
        GroupRepository::new(&self.pool).delete(group_id).await
    }

    async fn list_criteria(&self, group_id: Uuid) -> Result<Vec<Criterion>> {
        CriterionRepository::new(&self.pool)
            .list_by_group(group_id)
            .await
    }

    async fn replace_criteria(
        &self,
        group_id: Uuid,
        drafts: &[CriterionDraft],
    ) -> Result<Vec<Criterion>> {
        CriterionRepository::new(&self.pool)
            .replace_all(group_id, drafts)
            .await
    }

    async fn upsert_score(&self, score: &ScoreUpsert) -> Result<Score> {
        ScoreRepository::new(&self.pool).upsert(score).await
    }

    async fn list_scores(&self, group_id: Uuid) -> Result<Vec<Score>> {
        ScoreRepository::new(&self.pool).list_by_group(group_id).await
    }

    async fn list_judge_scores(&self, group_id: Uuid, judge_id: Uuid) -> Result<Vec<Score>> {
        ScoreRepository::new(&self.pool)
            .list_by_judge(group_id, judge_id)
            .await
    }

    async fn count_scores(&self, group_id: Uuid) -> Result<i64> {
        ScoreRepository::new(&self.pool).count_by_group(group_id).await
    }
}

#[async_trait]
impl SubmissionDirectory for PgStore {
    async fn list_submissions(&self, group_id: Uuid) -> Result<Vec<Submission>> {
        SubmissionRepository::new(&self.pool)
            .list_by_group(group_id)
            .await
    }

    async fn find_submission(&self, submission_id: Uuid) -> Result<Submission> {
        SubmissionRepository::new(&self.pool)
            .find_by_id(submission_id)
            .await
    }
}

#[async_trait]
impl IdentityLookup for PgStore {
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>> {
        let user = UserRepository::new(&self.pool).find_by_id(user_id).await?;
        Ok(user.map(|u| u.display_name))
    }
}

#[async_trait]
impl AdminAuthority for PgStore {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool> {
        let user = UserRepository::new(&self.pool).find_by_id(user_id).await?;
        Ok(user.is_some_and(|u| u.is_admin))
    }
}
