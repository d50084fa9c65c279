mod criterion;
mod judging_group;
mod score;
mod submission;
mod user;

pub use criterion::Criterion;
pub use judging_group::{ClosedReason, JudgingGroup, ScoringScale, Visibility};
pub use score::Score;
pub use submission::Submission;
pub use user::User;
