use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Submission;

/// Read-only access to the platform's submissions table
pub struct SubmissionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubmissionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT submission_id, group_id, title, slug, url, created_at
            FROM submissions
            WHERE group_id = $1
            ORDER BY created_at, submission_id
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool)
        .await?;

        Ok(submissions)
    }

    pub async fn find_by_id(&self, submission_id: Uuid) -> Result<Submission> {
        sqlx::query_as::<_, Submission>(
            r#"
            SELECT submission_id, group_id, title, slug, url, created_at
            FROM submissions
            WHERE submission_id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }
}
