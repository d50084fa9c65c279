use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::{ValidationError, ValidationRule};
use crate::dto::criterion::CriterionInput;
use crate::models::Criterion;
use crate::store::CriterionDraft;

/// Longest question the criteria table stores, in characters
pub const MAX_QUESTION_CHARS: usize = 500;

/// Decimal places a stored weight keeps
pub const WEIGHT_DECIMAL_PLACES: u32 = 2;

pub fn min_weight() -> Decimal {
    Decimal::new(1, 1)
}

pub fn max_weight() -> Decimal {
    Decimal::TEN
}

/// Validate a proposed criteria set against the group's current one and turn
/// it into drafts whose order is the array index.
///
/// Every violated rule is reported; nothing is written when any rule fails.
pub fn plan_replacement(
    existing: &[Criterion],
    items: &[CriterionInput],
) -> Result<Vec<CriterionDraft>, ValidationError> {
    let known: HashSet<Uuid> = existing.iter().map(|c| c.criterion_id).collect();
    let mut seen_questions: HashMap<String, usize> = HashMap::new();
    let mut seen_ids: HashSet<Uuid> = HashSet::new();
    let mut violations = Vec::new();
    let mut drafts = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let question = item.question.trim();

        if question.is_empty() {
            violations.push(ValidationRule::EmptyQuestion { index });
        } else if question.chars().count() > MAX_QUESTION_CHARS {
            violations.push(ValidationRule::QuestionTooLong {
                index,
                max: MAX_QUESTION_CHARS,
            });
        } else if seen_questions
            .insert(question.to_lowercase(), index)
            .is_some()
        {
            violations.push(ValidationRule::DuplicateQuestion {
                index,
                question: question.to_string(),
            });
        }

        let weight = item.weight.unwrap_or(Decimal::ONE);
        if weight < min_weight() || weight > max_weight() {
            violations.push(ValidationRule::WeightOutOfRange { index, weight });
        } else if weight.normalize().scale() > WEIGHT_DECIMAL_PLACES {
            violations.push(ValidationRule::WeightTooPrecise { index, weight });
        }

        if let Some(criterion_id) = item.criterion_id {
            if !known.contains(&criterion_id) {
                violations.push(ValidationRule::UnknownCriterion {
                    index,
                    criterion_id,
                });
            } else if !seen_ids.insert(criterion_id) {
                violations.push(ValidationRule::RepeatedCriterion {
                    index,
                    criterion_id,
                });
            }
        }

        drafts.push(CriterionDraft {
            criterion_id: item.criterion_id,
            question: question.to_string(),
            description: item
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            weight,
            order: i32::try_from(index).unwrap_or(i32::MAX),
        });
    }

    if violations.is_empty() {
        Ok(drafts)
    } else {
        Err(ValidationError { violations })
    }
}
