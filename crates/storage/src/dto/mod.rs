pub mod common;
pub mod criterion;
pub mod group;
pub mod results;
pub mod score;
