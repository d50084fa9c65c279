pub mod criteria;
pub mod groups;
pub mod results;
pub mod scores;
