mod grading;
mod service;

pub use grading::{grade_attempt, GradedAnswer};
pub use service::AssessmentService;
