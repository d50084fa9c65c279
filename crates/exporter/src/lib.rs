pub mod error;
pub mod report;

pub use error::{ExporterError, Result};
pub use report::{GroupReport, load_report};
