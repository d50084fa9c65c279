use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{JudgingGroup, ScoringScale};

/// Full derived view of a group's judging state. Never persisted; recomputed
/// from criteria, scores and submissions on every read.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ResultsSnapshot {
    pub rankings: Vec<RankingEntry>,
    pub criteria: Vec<CriterionBreakdown>,
    pub judges: Vec<JudgeSummary>,
    pub overall: GroupStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubmissionInfo {
    pub submission_id: Uuid,
    pub title: String,
    pub slug: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankingEntry {
    pub rank: i64,
    pub submission: SubmissionInfo,
    pub total_score: Decimal,
    pub average_score: Decimal,
    pub max_possible_score: Decimal,
    pub completion_percentage: Decimal,
    pub ratings_received: i64,
    pub judge_count: i64,
    pub criteria: Vec<SubmissionCriterionScores>,
}

/// Ratings one submission received on one criterion, ordered by judge id
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubmissionCriterionScores {
    pub criterion_id: Uuid,
    pub question: String,
    pub ratings: Vec<i16>,
    pub average_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CriterionBreakdown {
    pub criterion_id: Uuid,
    pub question: String,
    pub order: i32,
    pub weight: Decimal,
    pub average_score: Decimal,
    pub rating_count: i64,
    pub min_rating: Option<i16>,
    pub max_rating: Option<i16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct JudgeSummary {
    pub judge_id: Uuid,
    pub display_name: String,
    pub ratings_submitted: i64,
    pub average_rating: Decimal,
    pub completion_percentage: Decimal,
    pub submissions: Vec<JudgeSubmissionScores>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct JudgeSubmissionScores {
    pub submission_id: Uuid,
    pub title: String,
    pub ratings: Vec<JudgeRating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct JudgeRating {
    pub criterion_id: Uuid,
    pub question: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub scored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupStatistics {
    pub submission_count: i64,
    pub criteria_count: i64,
    pub submissions_judged: i64,
    pub judge_count: i64,
    pub average_score: Decimal,
    pub completion_percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupInfo {
    pub group_id: Uuid,
    pub name: String,
    pub slug: String,
    pub scoring_scale: ScoringScale,
    pub weighted: bool,
}

impl From<&JudgingGroup> for GroupInfo {
    fn from(group: &JudgingGroup) -> Self {
        Self {
            group_id: group.group_id,
            name: group.name.clone(),
            slug: group.slug.clone(),
            scoring_scale: group.scoring_scale,
            weighted: group.weighted,
        }
    }
}

/// Results as served to the results page: the snapshot without per-judge data
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupResultsResponse {
    pub group: GroupInfo,
    pub rankings: Vec<RankingEntry>,
    pub criteria: Vec<CriterionBreakdown>,
    pub overall: GroupStatistics,
}

impl GroupResultsResponse {
    pub fn new(group: &JudgingGroup, snapshot: ResultsSnapshot) -> Self {
        Self {
            group: GroupInfo::from(group),
            rankings: snapshot.rankings,
            criteria: snapshot.criteria,
            overall: snapshot.overall,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JudgeBreakdownResponse {
    pub group: GroupInfo,
    pub judges: Vec<JudgeSummary>,
}
