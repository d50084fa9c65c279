pub mod criterion;
pub mod group;
pub mod score;
pub mod submission;
pub mod user;
