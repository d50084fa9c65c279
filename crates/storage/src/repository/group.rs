use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::JudgingGroup;

const GROUP_COLUMNS: &str = r#"
    group_id, name, slug,
    judge_visibility, judge_password_hash,
    submission_page_visibility, submission_page_password_hash,
    results_visibility, results_password_hash,
    is_active, start_date, end_date,
    submission_page_image, submission_page_layout, submission_page_required_tag,
    scoring_scale, weighted, created_at
"#;

/// Repository for JudgingGroup database operations
pub struct GroupRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GroupRepository<'a> {
    /// Create a new GroupRepository
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List groups, newest first
    pub async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<JudgingGroup>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM judging_groups")
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM judging_groups \
             ORDER BY created_at DESC, group_id \
             LIMIT $1 OFFSET $2"
        );
        let groups = sqlx::query_as::<_, JudgingGroup>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        Ok((groups, total))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<JudgingGroup> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM judging_groups WHERE slug = $1");
        sqlx::query_as::<_, JudgingGroup>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)
    }

    /// Insert a fully built group
    pub async fn create(&self, group: &JudgingGroup) -> Result<JudgingGroup> {
        let sql = format!(
            r#"
            INSERT INTO judging_groups (
                group_id, name, slug,
                judge_visibility, judge_password_hash,
                submission_page_visibility, submission_page_password_hash,
                results_visibility, results_password_hash,
                is_active, start_date, end_date,
                submission_page_image, submission_page_layout, submission_page_required_tag,
                scoring_scale, weighted, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {GROUP_COLUMNS}
            "#
        );
        sqlx::query_as::<_, JudgingGroup>(&sql)
            .bind(group.group_id)
            .bind(&group.name)
            .bind(&group.slug)
            .bind(group.judge_visibility)
            .bind(&group.judge_password_hash)
            .bind(group.submission_page_visibility)
            .bind(&group.submission_page_password_hash)
            .bind(group.results_visibility)
            .bind(&group.results_password_hash)
            .bind(group.is_active)
            .bind(group.start_date)
            .bind(group.end_date)
            .bind(&group.submission_page_image)
            .bind(&group.submission_page_layout)
            .bind(&group.submission_page_required_tag)
            .bind(group.scoring_scale)
            .bind(group.weighted)
            .bind(group.created_at)
            .fetch_one(self.pool)
            .await
            .map_err(|e| StorageError::from(e).on_unique_violation("Slug already exists"))
    }

    /// Overwrite every mutable column of an existing group. The slug is not
    /// touched.
    pub async fn update(&self, group: &JudgingGroup) -> Result<JudgingGroup> {
        let sql = format!(
            r#"
            UPDATE judging_groups
            SET
                name = $2,
                judge_visibility = $3,
                judge_password_hash = $4,
                submission_page_visibility = $5,
                submission_page_password_hash = $6,
                results_visibility = $7,
                results_password_hash = $8,
                is_active = $9,
                start_date = $10,
                end_date = $11,
                submission_page_image = $12,
                submission_page_layout = $13,
                submission_page_required_tag = $14,
                scoring_scale = $15,
                weighted = $16
            WHERE group_id = $1
            RETURNING {GROUP_COLUMNS}
            "#
        );
        sqlx::query_as::<_, JudgingGroup>(&sql)
            .bind(group.group_id)
            .bind(&group.name)
            .bind(group.judge_visibility)
            .bind(&group.judge_password_hash)
            .bind(group.submission_page_visibility)
            .bind(&group.submission_page_password_hash)
            .bind(group.results_visibility)
            .bind(&group.results_password_hash)
            .bind(group.is_active)
            .bind(group.start_date)
            .bind(group.end_date)
            .bind(&group.submission_page_image)
            .bind(&group.submission_page_layout)
            .bind(&group.submission_page_required_tag)
            .bind(group.scoring_scale)
            .bind(group.weighted)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)
    }

    /// Delete a group together with its scores and criteria
    pub async fn delete(&self, group_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM judging_scores WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM judging_criteria WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM judging_groups WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
