use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::access::GatedResource;
use crate::error::StorageError;
use crate::models::ClosedReason;

pub type Result<T> = std::result::Result<T, JudgingError>;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Group,
    Criterion,
    Submission,
    Record,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Group => "Group",
            Self::Criterion => "Criterion",
            Self::Submission => "Submission",
            Self::Record => "Record",
        };
        f.write_str(name)
    }
}

/// One violated input rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationRule {
    EmptyQuestion { index: usize },
    QuestionTooLong { index: usize, max: usize },
    DuplicateQuestion { index: usize, question: String },
    WeightOutOfRange { index: usize, weight: Decimal },
    WeightTooPrecise { index: usize, weight: Decimal },
    UnknownCriterion { index: usize, criterion_id: Uuid },
    RepeatedCriterion { index: usize, criterion_id: Uuid },
    RatingOutOfRange { rating: i64, min: i16, max: i16 },
    MissingPassword { resource: GatedResource },
    InvalidTimeWindow,
    Field { field: String, message: String },
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuestion { index } => {
                write!(f, "criterion {index}: question must not be empty")
            }
            Self::QuestionTooLong { index, max } => {
                write!(f, "criterion {index}: question must be at most {max} characters")
            }
            Self::DuplicateQuestion { index, question } => {
                write!(f, "criterion {index}: question '{question}' is used more than once")
            }
            Self::WeightOutOfRange { index, weight } => {
                write!(f, "criterion {index}: weight {weight} must be between 0.1 and 10")
            }
            Self::WeightTooPrecise { index, weight } => {
                write!(f, "criterion {index}: weight {weight} has more than two decimal places")
            }
            Self::UnknownCriterion {
                index,
                criterion_id,
            } => write!(
                f,
                "criterion {index}: {criterion_id} does not belong to this group"
            ),
            Self::RepeatedCriterion {
                index,
                criterion_id,
            } => write!(f, "criterion {index}: {criterion_id} appears more than once"),
            Self::RatingOutOfRange { rating, min, max } => {
                write!(f, "rating {rating} must be between {min} and {max}")
            }
            Self::MissingPassword { resource } => {
                write!(f, "a password is required to protect the {resource}")
            }
            Self::InvalidTimeWindow => write!(f, "end date must be on or after start date"),
            Self::Field { field, message } => write!(f, "{field}: {message}"),
        }
    }
}

/// Malformed input; carries every violated rule and is never partially applied
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub violations: Vec<ValidationRule>,
}

impl ValidationError {
    pub fn single(rule: ValidationRule) -> Self {
        Self {
            violations: vec![rule],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations: Vec<ValidationRule> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationRule::Field {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        violations.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        Self { violations }
    }
}

#[derive(Debug, Error)]
pub enum JudgingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid credential for the {0}")]
    InvalidCredential(GatedResource),

    #[error("Caller identity required")]
    IdentityRequired,

    #[error("Admin access required")]
    AdminRequired,

    #[error("Group closed: {0}")]
    GroupClosed(ClosedReason),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Store failure; transient from the caller's point of view
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for JudgingError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound => Self::NotFound(Entity::Record),
            StorageError::ConstraintViolation(msg) => Self::Conflict(msg),
            other => Self::Storage(other),
        }
    }
}

impl From<validator::ValidationErrors> for JudgingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.into())
    }
}

/// Attaches the missing entity to a storage `NotFound`
pub(crate) trait NotFoundExt<T> {
    fn or_not_found(self, entity: Entity) -> Result<T>;
}

impl<T> NotFoundExt<T> for std::result::Result<T, StorageError> {
    fn or_not_found(self, entity: Entity) -> Result<T> {
        self.map_err(|e| match e {
            StorageError::NotFound => JudgingError::NotFound(entity),
            other => other.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_not_found_maps_to_entity() {
        let result: std::result::Result<(), StorageError> = Err(StorageError::NotFound);
        assert!(matches!(
            result.or_not_found(Entity::Group),
            Err(JudgingError::NotFound(Entity::Group))
        ));
    }

    #[test]
    fn test_constraint_violation_is_conflict() {
        let err = JudgingError::from(StorageError::ConstraintViolation("taken".to_string()));
        assert!(matches!(err, JudgingError::Conflict(msg) if msg == "taken"));
    }

    #[test]
    fn test_validation_message_lists_every_rule() {
        let err = ValidationError {
            violations: vec![
                ValidationRule::EmptyQuestion { index: 0 },
                ValidationRule::InvalidTimeWindow,
            ],
        };
        assert_eq!(
            err.to_string(),
            "criterion 0: question must not be empty; end date must be on or after start date"
        );
    }
}
