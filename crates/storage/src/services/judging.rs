use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::access::{self, AccessDecision, Caller, GatedResource};
use super::aggregation::{self, AggregationInput};
use super::criteria;
use super::error::{Entity, JudgingError, NotFoundExt, Result, ValidationError, ValidationRule};
use crate::dto::common::PaginationParams;
use crate::dto::criterion::CriterionInput;
use crate::dto::group::{CreateGroupRequest, UpdateGroupRequest};
use crate::dto::results::{GroupInfo, GroupResultsResponse, JudgeBreakdownResponse, ResultsSnapshot};
use crate::dto::score::SubmitScoreRequest;
use crate::models::{Criterion, JudgingGroup, Score, ScoringScale, Visibility};
use crate::store::{AdminAuthority, IdentityLookup, JudgingStore, ScoreUpsert, SubmissionDirectory};

/// Entry point for every judging operation exposed to callers.
///
/// Holds no mutable state of its own: every read recomputes from the stores.
#[derive(Clone)]
pub struct JudgingService {
    store: Arc<dyn JudgingStore>,
    submissions: Arc<dyn SubmissionDirectory>,
    identities: Arc<dyn IdentityLookup>,
    admins: Arc<dyn AdminAuthority>,
}

impl JudgingService {
    pub fn new(
        store: Arc<dyn JudgingStore>,
        submissions: Arc<dyn SubmissionDirectory>,
        identities: Arc<dyn IdentityLookup>,
        admins: Arc<dyn AdminAuthority>,
    ) -> Self {
        Self {
            store,
            submissions,
            identities,
            admins,
        }
    }

    /// Build a service whose store also serves as every collaborator
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: JudgingStore + SubmissionDirectory + IdentityLookup + AdminAuthority + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    pub async fn is_admin(&self, caller: &Caller) -> Result<bool> {
        match caller {
            Caller::System => Ok(true),
            Caller::User(user_id) => Ok(self.admins.is_admin(*user_id).await?),
            Caller::Anonymous => Ok(false),
        }
    }

    async fn require_admin(&self, caller: &Caller) -> Result<()> {
        if self.is_admin(caller).await? {
            Ok(())
        } else {
            tracing::warn!(?caller, "Admin-only operation refused");
            Err(JudgingError::AdminRequired)
        }
    }

    async fn group(&self, slug: &str) -> Result<JudgingGroup> {
        self.store
            .find_group_by_slug(slug)
            .await
            .or_not_found(Entity::Group)
    }

    async fn gate(
        &self,
        group: &JudgingGroup,
        caller: &Caller,
        resource: GatedResource,
        password: Option<&str>,
    ) -> Result<AccessDecision> {
        let is_admin = self.is_admin(caller).await?;
        let decision = access::authorize(group, resource, password, is_admin);
        if !decision.granted {
            tracing::warn!(group = %group.slug, %resource, "Access denied");
        }
        Ok(decision)
    }

    pub async fn list_groups(
        &self,
        caller: &Caller,
        pagination: PaginationParams,
    ) -> Result<(Vec<JudgingGroup>, i64)> {
        self.require_admin(caller).await?;
        Ok(self
            .store
            .list_groups(pagination.offset(), pagination.limit())
            .await?)
    }

    pub async fn get_group(&self, slug: &str) -> Result<JudgingGroup> {
        self.group(slug).await
    }

    pub async fn create_group(
        &self,
        caller: &Caller,
        request: CreateGroupRequest,
    ) -> Result<JudgingGroup> {
        self.require_admin(caller).await?;
        request.validate()?;

        let mut violations = Vec::new();
        check_window(request.start_date, request.end_date, &mut violations);
        let judge_password_hash = protect(
            GatedResource::JudgeInterface,
            request.judge_visibility,
            request.judge_password.as_deref(),
            None,
            &mut violations,
        )?;
        let submission_page_password_hash = protect(
            GatedResource::SubmissionPage,
            request.submission_page_visibility,
            request.submission_page_password.as_deref(),
            None,
            &mut violations,
        )?;
        let results_password_hash = protect(
            GatedResource::Results,
            request.results_visibility,
            request.results_password.as_deref(),
            None,
            &mut violations,
        )?;
        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }

        let group = JudgingGroup {
            group_id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            slug: request.slug,
            judge_visibility: request.judge_visibility,
            judge_password_hash,
            submission_page_visibility: request.submission_page_visibility,
            submission_page_password_hash,
            results_visibility: request.results_visibility,
            results_password_hash,
            is_active: request.is_active,
            start_date: request.start_date,
            end_date: request.end_date,
            submission_page_image: request.submission_page_image,
            submission_page_layout: request.submission_page_layout,
            submission_page_required_tag: request.submission_page_required_tag,
            scoring_scale: request.scoring_scale,
            weighted: request.weighted,
            created_at: Utc::now(),
        };

        let created = self.store.insert_group(&group).await?;
        tracing::info!(group = %created.slug, "Judging group created");
        Ok(created)
    }

    pub async fn update_group(
        &self,
        caller: &Caller,
        slug: &str,
        request: UpdateGroupRequest,
    ) -> Result<JudgingGroup> {
        self.require_admin(caller).await?;
        request.validate()?;

        let existing = self.group(slug).await?;
        let mut group = existing.clone();

        if let Some(name) = request.name {
            group.name = name.trim().to_string();
        }
        if let Some(is_active) = request.is_active {
            group.is_active = is_active;
        }
        if request.clear_window {
            group.start_date = None;
            group.end_date = None;
        }
        if request.start_date.is_some() {
            group.start_date = request.start_date;
        }
        if request.end_date.is_some() {
            group.end_date = request.end_date;
        }
        if request.submission_page_image.is_some() {
            group.submission_page_image = request.submission_page_image;
        }
        if request.submission_page_layout.is_some() {
            group.submission_page_layout = request.submission_page_layout;
        }
        if request.submission_page_required_tag.is_some() {
            group.submission_page_required_tag = request.submission_page_required_tag;
        }
        if let Some(weighted) = request.weighted {
            group.weighted = weighted;
        }

        let mut violations = Vec::new();
        check_window(group.start_date, group.end_date, &mut violations);

        group.judge_visibility = request.judge_visibility.unwrap_or(group.judge_visibility);
        group.judge_password_hash = protect(
            GatedResource::JudgeInterface,
            group.judge_visibility,
            request.judge_password.as_deref(),
            existing.judge_password_hash.as_deref(),
            &mut violations,
        )?;
        group.submission_page_visibility = request
            .submission_page_visibility
            .unwrap_or(group.submission_page_visibility);
        group.submission_page_password_hash = protect(
            GatedResource::SubmissionPage,
            group.submission_page_visibility,
            request.submission_page_password.as_deref(),
            existing.submission_page_password_hash.as_deref(),
            &mut violations,
        )?;
        group.results_visibility = request
            .results_visibility
            .unwrap_or(group.results_visibility);
        group.results_password_hash = protect(
            GatedResource::Results,
            group.results_visibility,
            request.results_password.as_deref(),
            existing.results_password_hash.as_deref(),
            &mut violations,
        )?;

        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }

        if let Some(scale) = request.scoring_scale
            && scale != existing.scoring_scale
        {
            let scored = self.store.count_scores(existing.group_id).await?;
            if scored > 0 {
                return Err(JudgingError::Conflict(format!(
                    "Scoring scale cannot change after {scored} scores were recorded"
                )));
            }
            group.scoring_scale = scale;
        }

        let updated = self.store.update_group(&group).await?;
        tracing::info!(group = %updated.slug, "Judging group updated");
        Ok(updated)
    }

    pub async fn delete_group(&self, caller: &Caller, slug: &str) -> Result<()> {
        self.require_admin(caller).await?;
        let group = self.group(slug).await?;
        self.store
            .delete_group(group.group_id)
            .await
            .or_not_found(Entity::Group)?;
        tracing::info!(group = %group.slug, "Judging group deleted");
        Ok(())
    }

    /// Stateless access check for one of the group's gated resources
    pub async fn check_access(
        &self,
        caller: &Caller,
        slug: &str,
        resource: GatedResource,
        password: Option<&str>,
    ) -> Result<AccessDecision> {
        let group = self.group(slug).await?;
        self.gate(&group, caller, resource, password).await
    }

    pub async fn list_criteria(
        &self,
        caller: &Caller,
        slug: &str,
        password: Option<&str>,
    ) -> Result<Vec<Criterion>> {
        let group = self.group(slug).await?;
        self.gate(&group, caller, GatedResource::JudgeInterface, password)
            .await?
            .require(GatedResource::JudgeInterface)?;
        Ok(self.store.list_criteria(group.group_id).await?)
    }

    /// Replace the group's whole criteria set in one atomic write
    pub async fn save_criteria(
        &self,
        caller: &Caller,
        slug: &str,
        items: &[CriterionInput],
    ) -> Result<Vec<Criterion>> {
        self.require_admin(caller).await?;
        let group = self.group(slug).await?;

        let existing = self.store.list_criteria(group.group_id).await?;
        let drafts = criteria::plan_replacement(&existing, items)?;
        let saved = self
            .store
            .replace_criteria(group.group_id, &drafts)
            .await?;

        tracing::info!(group = %group.slug, count = saved.len(), "Criteria replaced");
        Ok(saved)
    }

    pub async fn submit_score(
        &self,
        caller: &Caller,
        slug: &str,
        password: Option<&str>,
        request: SubmitScoreRequest,
        now: DateTime<Utc>,
    ) -> Result<Score> {
        let judge_id = caller.user_id().ok_or(JudgingError::IdentityRequired)?;
        let group = self.group(slug).await?;

        self.gate(&group, caller, GatedResource::JudgeInterface, password)
            .await?
            .require(GatedResource::JudgeInterface)?;

        if let Some(reason) = group.closed_reason(now) {
            return Err(JudgingError::GroupClosed(reason));
        }

        request.validate()?;
        let scale = group.scoring_scale;
        let rating = i16::try_from(request.rating)
            .ok()
            .filter(|rating| scale.contains(*rating))
            .ok_or_else(|| {
                ValidationError::single(ValidationRule::RatingOutOfRange {
                    rating: request.rating,
                    min: ScoringScale::MIN_RATING,
                    max: scale.max_rating(),
                })
            })?;

        let criteria = self.store.list_criteria(group.group_id).await?;
        if !criteria
            .iter()
            .any(|c| c.criterion_id == request.criterion_id)
        {
            return Err(JudgingError::NotFound(Entity::Criterion));
        }

        let submission = self
            .submissions
            .find_submission(request.submission_id)
            .await
            .or_not_found(Entity::Submission)?;
        if submission.group_id != group.group_id {
            return Err(JudgingError::NotFound(Entity::Submission));
        }

        let score = self
            .store
            .upsert_score(&ScoreUpsert {
                group_id: group.group_id,
                judge_id,
                submission_id: request.submission_id,
                criterion_id: request.criterion_id,
                rating,
                comment: request
                    .comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            })
            .await?;

        tracing::info!(
            group = %group.slug,
            %judge_id,
            submission_id = %score.submission_id,
            criterion_id = %score.criterion_id,
            rating = score.rating,
            "Score recorded"
        );
        Ok(score)
    }

    /// The calling judge's own scores in the group
    pub async fn my_scores(
        &self,
        caller: &Caller,
        slug: &str,
        password: Option<&str>,
    ) -> Result<Vec<Score>> {
        let judge_id = caller.user_id().ok_or(JudgingError::IdentityRequired)?;
        let group = self.group(slug).await?;
        self.gate(&group, caller, GatedResource::JudgeInterface, password)
            .await?
            .require(GatedResource::JudgeInterface)?;
        Ok(self
            .store
            .list_judge_scores(group.group_id, judge_id)
            .await?)
    }

    pub async fn get_group_results(
        &self,
        caller: &Caller,
        slug: &str,
        password: Option<&str>,
    ) -> Result<GroupResultsResponse> {
        let group = self.group(slug).await?;
        self.gate(&group, caller, GatedResource::Results, password)
            .await?
            .require(GatedResource::Results)?;

        let snapshot = self.snapshot(&group).await?;
        Ok(GroupResultsResponse::new(&group, snapshot))
    }

    pub async fn get_judge_breakdown(
        &self,
        caller: &Caller,
        slug: &str,
    ) -> Result<JudgeBreakdownResponse> {
        self.require_admin(caller).await?;
        let group = self.group(slug).await?;
        let snapshot = self.snapshot(&group).await?;

        Ok(JudgeBreakdownResponse {
            group: GroupInfo::from(&group),
            judges: snapshot.judges,
        })
    }

    /// Full snapshot for export; admin only
    pub async fn export_snapshot(
        &self,
        caller: &Caller,
        slug: &str,
    ) -> Result<(JudgingGroup, ResultsSnapshot)> {
        self.require_admin(caller).await?;
        let group = self.group(slug).await?;
        let snapshot = self.snapshot(&group).await?;
        Ok((group, snapshot))
    }

    async fn snapshot(&self, group: &JudgingGroup) -> Result<ResultsSnapshot> {
        let criteria = self.store.list_criteria(group.group_id).await?;
        let scores = self.store.list_scores(group.group_id).await?;
        let submissions = self.submissions.list_submissions(group.group_id).await?;

        let judge_ids: BTreeSet<Uuid> = scores.iter().map(|s| s.judge_id).collect();
        let mut judge_names = BTreeMap::new();
        for judge_id in judge_ids {
            if let Some(name) = self.identities.display_name(judge_id).await? {
                judge_names.insert(judge_id, name);
            }
        }

        Ok(aggregation::aggregate(&AggregationInput::for_group(
            group,
            &criteria,
            &scores,
            &submissions,
            &judge_names,
        )))
    }
}

fn check_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    violations: &mut Vec<ValidationRule>,
) {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        violations.push(ValidationRule::InvalidTimeWindow);
    }
}

/// Resolve the stored hash for a resource: a new password is hashed, an
/// existing hash is kept, and a protected resource without either is
/// reported as a violation.
fn protect(
    resource: GatedResource,
    visibility: Visibility,
    new_password: Option<&str>,
    current_hash: Option<&str>,
    violations: &mut Vec<ValidationRule>,
) -> Result<Option<String>> {
    match (new_password, current_hash) {
        (Some(password), _) => access::hash_password(password).map(Some),
        (None, Some(hash)) => Ok(Some(hash.to_string())),
        (None, None) => {
            if visibility == Visibility::PasswordProtected {
                violations.push(ValidationRule::MissingPassword { resource });
            }
            Ok(None)
        }
    }
}
