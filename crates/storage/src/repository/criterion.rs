use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Criterion;
use crate::store::CriterionDraft;

/// Repository for Criterion database operations
pub struct CriterionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CriterionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a group's criteria in display order
    pub async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<Criterion>> {
        let criteria = sqlx::query_as::<_, Criterion>(
            r#"
            SELECT criterion_id, group_id, question, description, weight, position, created_at
            FROM judging_criteria
            WHERE group_id = $1
            ORDER BY position, criterion_id
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool)
        .await?;

        Ok(criteria)
    }

    /// Replace the group's criteria with `drafts` in one transaction.
    ///
    /// Drafts with an id are updated in place, drafts without one are
    /// inserted, and stored criteria missing from `drafts` are deleted. Any
    /// failure rolls the whole set back.
    pub async fn replace_all(
        &self,
        group_id: Uuid,
        drafts: &[CriterionDraft],
    ) -> Result<Vec<Criterion>> {
        let mut tx = self.pool.begin().await?;

        let kept: Vec<Uuid> = drafts.iter().filter_map(|d| d.criterion_id).collect();

        sqlx::query(
            r#"
            DELETE FROM judging_criteria
            WHERE group_id = $1 AND NOT (criterion_id = ANY($2))
            "#,
        )
        .bind(group_id)
        .bind(&kept)
        .execute(&mut *tx)
        .await?;

        for draft in drafts {
            match draft.criterion_id {
                Some(criterion_id) => {
                    let result = sqlx::query(
                        r#"
                        UPDATE judging_criteria
                        SET question = $3, description = $4, weight = $5, position = $6
                        WHERE criterion_id = $1 AND group_id = $2
                        "#,
                    )
                    .bind(criterion_id)
                    .bind(group_id)
                    .bind(&draft.question)
                    .bind(&draft.description)
                    .bind(draft.weight)
                    .bind(draft.order)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(StorageError::NotFound);
                    }
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO judging_criteria (
                            criterion_id, group_id, question, description, weight, position, created_at
                        )
                        VALUES ($1, $2, $3, $4, $5, $6, $7)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(group_id)
                    .bind(&draft.question)
                    .bind(&draft.description)
                    .bind(draft.weight)
                    .bind(draft.order)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        // Deferred uniqueness constraints are checked here.
        tx.commit()
            .await
            .map_err(|e| StorageError::from(e).on_unique_violation("Duplicate criterion"))?;

        self.list_by_group(group_id).await
    }
}
