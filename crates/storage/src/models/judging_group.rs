use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Access tier of a gated resource
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "visibility", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    PasswordProtected,
}

/// Rating scale a group enforces on every score
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "scoring_scale", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScoringScale {
    FivePoint,
    #[default]
    TenPoint,
}

impl ScoringScale {
    pub const MIN_RATING: i16 = 1;

    pub fn max_rating(self) -> i16 {
        match self {
            Self::FivePoint => 5,
            Self::TenPoint => 10,
        }
    }

    pub fn contains(self, rating: i16) -> bool {
        (Self::MIN_RATING..=self.max_rating()).contains(&rating)
    }
}

/// Why a group currently refuses new scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClosedReason {
    Inactive,
    NotStarted,
    Ended,
}

impl fmt::Display for ClosedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "judging is disabled for this group"),
            Self::NotStarted => write!(f, "judging has not started yet"),
            Self::Ended => write!(f, "judging has ended"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JudgingGroup {
    pub group_id: Uuid,
    pub name: String,
    pub slug: String,
    pub judge_visibility: Visibility,
    #[serde(skip)]
    pub judge_password_hash: Option<String>,
    pub submission_page_visibility: Visibility,
    #[serde(skip)]
    pub submission_page_password_hash: Option<String>,
    pub results_visibility: Visibility,
    #[serde(skip)]
    pub results_password_hash: Option<String>,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub submission_page_image: Option<String>,
    pub submission_page_layout: Option<String>,
    pub submission_page_required_tag: Option<String>,
    pub scoring_scale: ScoringScale,
    pub weighted: bool,
    pub created_at: DateTime<Utc>,
}

impl JudgingGroup {
    /// Returns the reason scoring is refused at `now`, if any.
    /// Both window bounds are inclusive.
    pub fn closed_reason(&self, now: DateTime<Utc>) -> Option<ClosedReason> {
        if !self.is_active {
            return Some(ClosedReason::Inactive);
        }
        if self.start_date.is_some_and(|start| now < start) {
            return Some(ClosedReason::NotStarted);
        }
        if self.end_date.is_some_and(|end| now > end) {
            return Some(ClosedReason::Ended);
        }
        None
    }
}
