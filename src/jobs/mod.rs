//! Asynchronous analysis jobs
//!
//! A job wraps one background pipeline run so callers can submit a request,
//! return immediately, and poll for progress and the final report.

mod status;
mod tracker;

pub use status::JobStatus;
pub use tracker::{JobError, JobProgress, JobRecord, JobTracker, JobView, TOTAL_PHASES};
