//! Business insights over the pipeline output and their text/JSON rendering.

pub mod insights;
pub mod render;

pub use insights::{build_report, InsightReport};
pub use render::{render, ReportFormat};
