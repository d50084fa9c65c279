use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AdminAuthority, CriterionDraft, IdentityLookup, JudgingStore, ScoreUpsert, SubmissionDirectory,
};
use crate::error::{Result, StorageError};
use crate::models::{Criterion, JudgingGroup, Score, Submission, User};

type ScoreKey = (Uuid, Uuid, Uuid);

#[derive(Debug, Default)]
struct MemoryState {
    groups: BTreeMap<Uuid, JudgingGroup>,
    criteria: BTreeMap<Uuid, Criterion>,
    scores: BTreeMap<ScoreKey, Score>,
    submissions: BTreeMap<Uuid, Submission>,
    users: BTreeMap<Uuid, User>,
}

/// In-process store implementing every store trait.
///
/// Each write runs under a single write-lock acquisition, which gives the same
/// all-or-nothing behaviour as the Postgres transactions. Used by tests and
/// local tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a submission in the directory
    pub async fn add_submission(&self, submission: Submission) {
        let mut state = self.state.write().await;
        state
            .submissions
            .insert(submission.submission_id, submission);
    }

    pub async fn add_user(&self, user: User) {
        let mut state = self.state.write().await;
        state.users.insert(user.user_id, user);
    }
}

fn question_key(question: &str) -> String {
    question.trim().to_lowercase()
}

#[async_trait]
impl JudgingStore for MemoryStore {
    async fn list_groups(&self, offset: i64, limit: i64) -> Result<(Vec<JudgingGroup>, i64)> {
        let state = self.state.read().await;
        let mut groups: Vec<JudgingGroup> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.group_id.cmp(&b.group_id))
        });

        let total = groups.len() as i64;
        let page = groups
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();

        Ok((page, total))
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<JudgingGroup> {
        let state = self.state.read().await;
        state
            .groups
            .values()
            .find(|g| g.slug == slug)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn insert_group(&self, group: &JudgingGroup) -> Result<JudgingGroup> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.slug == group.slug) {
            return Err(StorageError::ConstraintViolation(
                "Slug already exists".to_string(),
            ));
        }
        state.groups.insert(group.group_id, group.clone());
        Ok(group.clone())
    }

    async fn update_group(&self, group: &JudgingGroup) -> Result<JudgingGroup> {
        let mut state = self.state.write().await;
        let stored = state
            .groups
            .get_mut(&group.group_id)
            .ok_or(StorageError::NotFound)?;

        let slug = stored.slug.clone();
        let created_at = stored.created_at;
        *stored = JudgingGroup {
            slug,
            created_at,
            ..group.clone()
        };

        Ok(stored.clone())
    }

    async fn delete_group(&self, group_id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        if state.groups.remove(&group_id).is_none() {
            return Err(StorageError::NotFound);
        }
        state.scores.retain(|_, s| s.group_id != group_id);
        state.criteria.retain(|_, c| c.group_id != group_id);
        Ok(())
    }

    async fn list_criteria(&self, group_id: Uuid) -> Result<Vec<Criterion>> {
        let state = self.state.read().await;
        let mut criteria: Vec<Criterion> = state
            .criteria
            .values()
            .filter(|c| c.group_id == group_id)
            .cloned()
            .collect();
        criteria.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.criterion_id.cmp(&b.criterion_id))
        });
        Ok(criteria)
    }

    async fn replace_criteria(
        &self,
        group_id: Uuid,
        drafts: &[CriterionDraft],
    ) -> Result<Vec<Criterion>> {
        {
            let mut state = self.state.write().await;
            if !state.groups.contains_key(&group_id) {
                return Err(StorageError::NotFound);
            }

            let mut next: BTreeMap<Uuid, Criterion> = BTreeMap::new();
            let mut keys = HashSet::new();
            let mut positions = HashSet::new();
            let now = Utc::now();

            for draft in drafts {
                if !keys.insert(question_key(&draft.question)) || !positions.insert(draft.order) {
                    return Err(StorageError::ConstraintViolation(
                        "Duplicate criterion".to_string(),
                    ));
                }

                let criterion = match draft.criterion_id {
                    Some(criterion_id) => {
                        let existing = state
                            .criteria
                            .get(&criterion_id)
                            .filter(|c| c.group_id == group_id)
                            .ok_or(StorageError::NotFound)?;
                        Criterion {
                            question: draft.question.clone(),
                            description: draft.description.clone(),
                            weight: draft.weight,
                            order: draft.order,
                            ..existing.clone()
                        }
                    }
                    None => Criterion {
                        criterion_id: Uuid::new_v4(),
                        group_id,
                        question: draft.question.clone(),
                        description: draft.description.clone(),
                        weight: draft.weight,
                        order: draft.order,
                        created_at: now,
                    },
                };
                next.insert(criterion.criterion_id, criterion);
            }

            state.criteria.retain(|_, c| c.group_id != group_id);
            state.criteria.extend(next);
        }

        self.list_criteria(group_id).await
    }

    async fn upsert_score(&self, score: &ScoreUpsert) -> Result<Score> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(&score.group_id) {
            return Err(StorageError::NotFound);
        }

        let now = Utc::now();
        let key = (score.judge_id, score.submission_id, score.criterion_id);
        let stored = state
            .scores
            .entry(key)
            .and_modify(|existing| {
                existing.rating = score.rating;
                existing.comment = score.comment.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| Score {
                score_id: Uuid::new_v4(),
                group_id: score.group_id,
                judge_id: score.judge_id,
                submission_id: score.submission_id,
                criterion_id: score.criterion_id,
                rating: score.rating,
                comment: score.comment.clone(),
                created_at: now,
                updated_at: now,
            });

        Ok(stored.clone())
    }

    async fn list_scores(&self, group_id: Uuid) -> Result<Vec<Score>> {
        let state = self.state.read().await;
        Ok(state
            .scores
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn list_judge_scores(&self, group_id: Uuid, judge_id: Uuid) -> Result<Vec<Score>> {
        let state = self.state.read().await;
        Ok(state
            .scores
            .values()
            .filter(|s| s.group_id == group_id && s.judge_id == judge_id)
            .cloned()
            .collect())
    }

    async fn count_scores(&self, group_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .scores
            .values()
            .filter(|s| s.group_id == group_id)
            .count() as i64)
    }
}

#[async_trait]
impl SubmissionDirectory for MemoryStore {
    async fn list_submissions(&self, group_id: Uuid) -> Result<Vec<Submission>> {
        let state = self.state.read().await;
        let mut submissions: Vec<Submission> = state
            .submissions
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.submission_id.cmp(&b.submission_id))
        });
        Ok(submissions)
    }

    async fn find_submission(&self, submission_id: Uuid) -> Result<Submission> {
        let state = self.state.read().await;
        state
            .submissions
            .get(&submission_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl IdentityLookup for MemoryStore {
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>> {
        let state = self.state.read().await;
        Ok(state.users.get(&user_id).map(|u| u.display_name.clone()))
    }
}

#[async_trait]
impl AdminAuthority for MemoryStore {
    async fn is_admin(&self, user_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.users.get(&user_id).is_some_and(|u| u.is_admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScoringScale, Visibility};
    use rust_decimal::Decimal;

    fn group(slug: &str) -> JudgingGroup {
        JudgingGroup {
            group_id: Uuid::new_v4(),
            name: slug.to_string(),
            slug: slug.to_string(),
            judge_visibility: Visibility::Public,
            judge_password_hash: None,
            submission_page_visibility: Visibility::Public,
            submission_page_password_hash: None,
            results_visibility: Visibility::Public,
            results_password_hash: None,
            is_active: true,
            start_date: None,
            end_date: None,
            submission_page_image: None,
            submission_page_layout: None,
            submission_page_required_tag: None,
            scoring_scale: ScoringScale::TenPoint,
            weighted: false,
            created_at: Utc::now(),
        }
    }

    fn draft(criterion_id: Option<Uuid>, question: &str, order: i32) -> CriterionDraft {
        CriterionDraft {
            criterion_id,
            question: question.to_string(),
            description: None,
            weight: Decimal::ONE,
            order,
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_constraint_violation() {
        let store = MemoryStore::new();
        store.insert_group(&group("jam")).await.unwrap();

        let err = store.insert_group(&group("jam")).await.unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_replace_swaps_positions_in_place() {
        let store = MemoryStore::new();
        let g = store.insert_group(&group("jam")).await.unwrap();

        let first = store
            .replace_criteria(g.group_id, &[draft(None, "Design", 0), draft(None, "Fun", 1)])
            .await
            .unwrap();
        let design = first[0].criterion_id;
        let fun = first[1].criterion_id;

        let swapped = store
            .replace_criteria(
                g.group_id,
                &[draft(Some(fun), "Fun", 0), draft(Some(design), "Design", 1)],
            )
            .await
            .unwrap();

        assert_eq!(swapped[0].criterion_id, fun);
        assert_eq!(swapped[1].criterion_id, design);
    }

    #[tokio::test]
    async fn test_replace_with_foreign_id_leaves_set_untouched() {
        let store = MemoryStore::new();
        let g = store.insert_group(&group("jam")).await.unwrap();
        let before = store
            .replace_criteria(g.group_id, &[draft(None, "Design", 0)])
            .await
            .unwrap();

        let err = store
            .replace_criteria(g.group_id, &[draft(Some(Uuid::new_v4()), "Audio", 0)])
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::NotFound));
        assert_eq!(store.list_criteria(g.group_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_group_cascades() {
        let store = MemoryStore::new();
        let g = store.insert_group(&group("jam")).await.unwrap();
        let criteria = store
            .replace_criteria(g.group_id, &[draft(None, "Design", 0)])
            .await
            .unwrap();
        store
            .upsert_score(&ScoreUpsert {
                group_id: g.group_id,
                judge_id: Uuid::new_v4(),
                submission_id: Uuid::new_v4(),
                criterion_id: criteria[0].criterion_id,
                rating: 7,
                comment: None,
            })
            .await
            .unwrap();

        store.delete_group(g.group_id).await.unwrap();

        assert!(store.list_criteria(g.group_id).await.unwrap().is_empty());
        assert_eq!(store.count_scores(g.group_id).await.unwrap(), 0);
    }
}
