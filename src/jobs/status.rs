//! Lifecycle states of an analysis job

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a job
///
/// ```text
/// pending -> running -> completed
///    |          |
///    +----------+-----> failed
/// ```
///
/// `pending` may also go straight to a terminal state when the run finishes
/// before reporting any progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job has been created but the run has not reported progress yet
    Pending,

    /// Pipeline is executing
    Running,

    /// Report is available
    Completed,

    /// Run ended with an error
    Failed,
}

impl JobStatus {
    /// Returns true if no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
