use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{JudgingError, Result};
use crate::models::{JudgingGroup, Visibility};

/// Who is making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    /// A platform user; admin status is resolved through the admin authority
    User(Uuid),
    /// Holder of a configured API key, or a local operator tool
    System,
}

impl Caller {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GatedResource {
    JudgeInterface,
    SubmissionPage,
    Results,
}

impl fmt::Display for GatedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::JudgeInterface => "judge interface",
            Self::SubmissionPage => "submission page",
            Self::Results => "results page",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    Public,
    Password,
    AdminOverride,
    InvalidCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccessDecision {
    pub granted: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn grant(reason: AccessReason) -> Self {
        Self {
            granted: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            granted: false,
            reason: AccessReason::InvalidCredential,
        }
    }

    /// Converts a denial into `InvalidCredential` for `resource`
    pub fn require(self, resource: GatedResource) -> Result<()> {
        if self.granted {
            Ok(())
        } else {
            Err(JudgingError::InvalidCredential(resource))
        }
    }
}

/// Visibility and stored hash of `resource` on `group`
pub fn resource_tier(group: &JudgingGroup, resource: GatedResource) -> (Visibility, Option<&str>) {
    match resource {
        GatedResource::JudgeInterface => {
            (group.judge_visibility, group.judge_password_hash.as_deref())
        }
        GatedResource::SubmissionPage => (
            group.submission_page_visibility,
            group.submission_page_password_hash.as_deref(),
        ),
        GatedResource::Results => (
            group.results_visibility,
            group.results_password_hash.as_deref(),
        ),
    }
}

/// Stateless check of `supplied_password` against the resource's stored
/// hash. Admins bypass every tier.
pub fn authorize(
    group: &JudgingGroup,
    resource: GatedResource,
    supplied_password: Option<&str>,
    is_admin: bool,
) -> AccessDecision {
    if is_admin {
        return AccessDecision::grant(AccessReason::AdminOverride);
    }

    match resource_tier(group, resource) {
        (Visibility::Public, _) => AccessDecision::grant(AccessReason::Public),
        (Visibility::PasswordProtected, Some(hash)) => match supplied_password {
            Some(password) if verify_password(password, hash) => {
                AccessDecision::grant(AccessReason::Password)
            }
            _ => AccessDecision::deny(),
        },
        (Visibility::PasswordProtected, None) => AccessDecision::deny(),
    }
}

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| JudgingError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoringScale;
    use chrono::Utc;

    fn group_with_results(visibility: Visibility, hash: Option<String>) -> JudgingGroup {
        JudgingGroup {
            group_id: Uuid::new_v4(),
            name: "Jam".to_string(),
            slug: "jam".to_string(),
            judge_visibility: Visibility::Public,
            judge_password_hash: None,
            submission_page_visibility: Visibility::Public,
            submission_page_password_hash: None,
            results_visibility: visibility,
            results_password_hash: hash,
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

    #[test]
    fn test_public_resource_always_grants() {
        let group = group_with_results(Visibility::Public, None);
        let decision = authorize(&group, GatedResource::Results, None, false);
        assert_eq!(decision, AccessDecision::grant(AccessReason::Public));
    }

    #[test]
    fn test_protected_resource_checks_password() {
        let hash = hash_password("hunter2").unwrap();
        let group = group_with_results(Visibility::PasswordProtected, Some(hash));

        let missing = authorize(&group, GatedResource::Results, None, false);
        assert!(!missing.granted);
        assert_eq!(missing.reason, AccessReason::InvalidCredential);

        let wrong = authorize(&group, GatedResource::Results, Some("hunter3"), false);
        assert!(!wrong.granted);

        let right = authorize(&group, GatedResource::Results, Some("hunter2"), false);
        assert_eq!(right, AccessDecision::grant(AccessReason::Password));
    }

    #[test]
    fn test_admin_override_ignores_tier() {
        let group = group_with_results(Visibility::PasswordProtected, None);
        let decision = authorize(&group, GatedResource::Results, None, true);
        assert_eq!(decision, AccessDecision::grant(AccessReason::AdminOverride));
    }

    #[test]
    fn test_resources_are_gated_independently() {
        let hash = hash_password("results-only").unwrap();
        let group = group_with_results(Visibility::PasswordProtected, Some(hash));
        assert!(authorize(&group, GatedResource::JudgeInterface, None, false).granted);
        assert!(!authorize(&group, GatedResource::Results, None, false).granted);
    }

    #[test]
    fn test_malformed_hash_denies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_require_maps_denial_to_invalid_credential() {
        let err = AccessDecision::deny()
            .require(GatedResource::JudgeInterface)
            .unwrap_err();
        assert!(matches!(
            err,
            JudgingError::InvalidCredential(GatedResource::JudgeInterface)
        ));
    }
}
