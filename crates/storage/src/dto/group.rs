use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{JudgingGroup, ScoringScale, Visibility};

/// Request payload for creating a judging group
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Slug must be between 1 and 255 characters"
    ))]
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[serde(default)]
    pub judge_visibility: Visibility,

    #[validate(length(min = 1, max = 128))]
    pub judge_password: Option<String>,

    #[serde(default)]
    pub submission_page_visibility: Visibility,

    #[validate(length(min = 1, max = 128))]
    pub submission_page_password: Option<String>,

    #[serde(default)]
    pub results_visibility: Visibility,

    #[validate(length(min = 1, max = 128))]
    pub results_password: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,

    #[validate(url)]
    pub submission_page_image: Option<String>,

    #[validate(custom(function = "validate_layout"))]
    pub submission_page_layout: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub submission_page_required_tag: Option<String>,

    #[serde(default)]
    pub scoring_scale: ScoringScale,

    #[serde(default)]
    pub weighted: bool,
}

/// Request payload for updating a judging group. The slug is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 255))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    pub judge_visibility: Option<Visibility>,

    #[validate(length(min = 1, max = 128))]
    pub judge_password: Option<String>,

    pub submission_page_visibility: Option<Visibility>,

    #[validate(length(min = 1, max = 128))]
    pub submission_page_password: Option<String>,

    pub results_visibility: Option<Visibility>,

    #[validate(length(min = 1, max = 128))]
    pub results_password: Option<String>,

    pub is_active: Option<bool>,

    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,

    /// Removes both window bounds when set
    #[serde(default)]
    pub clear_window: bool,

    #[validate(url)]
    pub submission_page_image: Option<String>,

    #[validate(custom(function = "validate_layout"))]
    pub submission_page_layout: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub submission_page_required_tag: Option<String>,

    pub scoring_scale: Option<ScoringScale>,

    pub weighted: Option<bool>,
}

/// Group as exposed over the API; password hashes never leave the service
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub group_id: Uuid,
    pub name: String,
    pub slug: String,
    pub judge_visibility: Visibility,
    pub submission_page_visibility: Visibility,
    pub results_visibility: Visibility,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub submission_page_image: Option<String>,
    pub submission_page_layout: Option<String>,
    pub submission_page_required_tag: Option<String>,
    pub scoring_scale: ScoringScale,
    pub max_rating: i16,
    pub weighted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<JudgingGroup> for GroupResponse {
    fn from(group: JudgingGroup) -> Self {
        Self {
            group_id: group.group_id,
            name: group.name,
            slug: group.slug,
            judge_visibility: group.judge_visibility,
            submission_page_visibility: group.submission_page_visibility,
            results_visibility: group.results_visibility,
            is_active: group.is_active,
            start_date: group.start_date,
            end_date: group.end_date,
            submission_page_image: group.submission_page_image,
            submission_page_layout: group.submission_page_layout,
            submission_page_required_tag: group.submission_page_required_tag,
            max_rating: group.scoring_scale.max_rating(),
            scoring_scale: group.scoring_scale,
            weighted: group.weighted,
            created_at: group.created_at,
        }
    }
}

fn default_active() -> bool {
    true
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let is_valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if is_valid {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_slug"))
    }
}

fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut error = validator::ValidationError::new("blank");
        error.message = Some("Must not be blank".into());
        Err(error)
    } else {
        Ok(())
    }
}

fn validate_layout(layout: &str) -> Result<(), validator::ValidationError> {
    const LAYOUTS: &[&str] = &["default", "banner", "split", "minimal"];

    if LAYOUTS.contains(&layout) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_layout"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_rules() {
        assert!(validate_slug("spring-jam-2025").is_ok());
        assert!(validate_slug("Spring").is_err());
        assert!(validate_slug("-jam").is_err());
        assert!(validate_slug("jam--2025").is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateGroupRequest =
            serde_json::from_str(r#"{"name":"Jam","slug":"jam"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.is_active);
        assert_eq!(req.scoring_scale, ScoringScale::TenPoint);
        assert_eq!(req.results_visibility, Visibility::Public);
    }

    #[test]
    fn test_blank_name_rejected() {
        let req: CreateGroupRequest =
            serde_json::from_str(r#"{"name":"   ","slug":"blank"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let update = UpdateGroupRequest {
            name: Some("\t ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_unknown_layout_rejected() {
        let req = UpdateGroupRequest {
            submission_page_layout: Some("carousel".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
