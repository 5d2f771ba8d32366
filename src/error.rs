use std::path::PathBuf;

/// Errors produced by plan generation and its surrounding plumbing.
///
/// Every variant is recoverable at the calling layer; nothing in the crate
/// terminates the process on its own.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Unknown activity level '{value}' (expected one of: {expected})")]
    UnknownActivityLevel { value: String, expected: String },

    #[error("Unknown goal '{value}' (expected one of: {expected})")]
    UnknownGoal { value: String, expected: String },

    #[error("Plan duration must be positive (got {duration_days} days)")]
    EmptyPlan { duration_days: i64 },

    #[error("Invalid profile field '{field}': {detail}")]
    InvalidProfile { field: &'static str, detail: String },

    #[error("Assembled plan is inconsistent: {detail}")]
    InvalidPlan { detail: String },

    #[error("Narrative unavailable: {reason}")]
    NarrativeUnavailable { reason: String },

    #[error("Activity factor for '{level}' must be a positive number (got {value})")]
    InvalidActivityFactor { level: String, value: f64 },

    #[error("Failed to parse environment variable '{var}': {detail}")]
    ConfigEnvParseError { var: String, detail: String },

    #[error("Failed to read profile file {path}: {detail}")]
    ProfileFileFailed { path: PathBuf, detail: String },

    #[error("Plan export failed: {detail}")]
    ExportFailed { detail: String },

    #[error("Failed to write plan summary {path}: {detail}")]
    SummaryWriteFailed { path: PathBuf, detail: String },
}

impl PlanError {
    pub(crate) fn invalid_profile(field: &'static str, detail: impl Into<String>) -> Self {
        PlanError::InvalidProfile {
            field,
            detail: detail.into(),
        }
    }

    /// True for the errors raised while checking user input, before any
    /// derived value is computed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PlanError::InvalidProfile { .. }
                | PlanError::UnknownActivityLevel { .. }
                | PlanError::UnknownGoal { .. }
                | PlanError::EmptyPlan { .. }
        )
    }
}
