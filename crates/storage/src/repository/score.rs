use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Score;
use crate::store::ScoreUpsert;

pub struct ScoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ScoreRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite the score for `(judge, submission, criterion)`
    pub async fn upsert(&self, score: &ScoreUpsert) -> Result<Score> {
        let stored = sqlx::query_as::<_, Score>(
            r#"
            INSERT INTO judging_scores (
                score_id, group_id, judge_id, submission_id, criterion_id, rating, comment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (judge_id, submission_id, criterion_id)
            DO UPDATE SET
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                updated_at = CURRENT_TIMESTAMP
            RETURNING score_id, group_id, judge_id, submission_id, criterion_id,
                      rating, comment, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(score.group_id)
        .bind(score.judge_id)
        .bind(score.submission_id)
        .bind(score.criterion_id)
        .bind(score.rating)
        .bind(&score.comment)
        .fetch_one(self.pool)
        .await
        .map_err(StorageError::from)
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                StorageError::NotFound
            } else {
                e
            }
        })?;

        Ok(stored)
    }

    pub async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<Score>> {
        let scores = sqlx::query_as::<_, Score>(
            r#"
            SELECT score_id, group_id, judge_id, submission_id, criterion_id,
                   rating, comment, created_at, updated_at
            FROM judging_scores
            WHERE group_id = $1
            ORDER BY submission_id, judge_id, criterion_id
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool)
        .await?;

        Ok(scores)
    }

    pub async fn list_by_judge(&self, group_id: Uuid, judge_id: Uuid) -> Result<Vec<Score>> {
        let scores = sqlx::query_as::<_, Score>(
            r#"
            SELECT score_id, group_id, judge_id, submission_id, criterion_id,
                   rating, comment, created_at, updated_at
            FROM judging_scores
            WHERE group_id = $1 AND judge_id = $2
            ORDER BY submission_id, criterion_id
            "#,
        )
        .bind(group_id)
        .bind(judge_id)
        .fetch_all(self.pool)
        .await?;

        Ok(scores)
    }

    pub async fn count_by_group(&self, group_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM judging_scores WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
