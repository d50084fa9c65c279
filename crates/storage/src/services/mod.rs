pub mod access;
pub mod aggregation;
pub mod criteria;
pub mod error;
pub mod export;
pub mod judging;

pub use access::{AccessDecision, AccessReason, Caller, GatedResource};
pub use error::{Entity, JudgingError, ValidationError, ValidationRule};
pub use judging::JudgingService;
