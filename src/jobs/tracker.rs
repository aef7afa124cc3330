//! In-memory tracking of asynchronous analysis jobs

use crate::config::JobsConfig;
use crate::jobs::status::JobStatus;
use crate::model::{AnalysisReport, AnalysisRequest, ErrorInfo};
use crate::pipeline::Pipeline;
use crate::AnalyzerError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use uuid::Uuid;

/// Number of pipeline phases reported in job progress
pub const TOTAL_PHASES: u8 = 3;

/// Job tracker failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("job {id} is already {status}")]
    AlreadyTerminal { id: String, status: JobStatus },
}

/// One tracked pipeline invocation
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: String,
    pub status: JobStatus,
    pub phase: u8,
    /// Whole-number completion, 0 to 100
    pub percent: u8,
    pub message: String,
    pub result: Option<AnalysisReport>,
    pub error: Option<ErrorInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            phase: 1,
            percent: 0,
            message: "Job queued".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// External representation returned by the status endpoint
    pub fn view(&self) -> JobView {
        JobView {
            job_id: self.id.clone(),
            status: self.status,
            progress: JobProgress {
                current_phase: self.phase,
                total_phases: TOTAL_PHASES,
                message: self.message.clone(),
                percent: self.percent,
            },
            result: self.result.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub current_phase: u8,
    pub total_phases: u8,
    pub message: String,
    /// Serialized as a JSON integer in 0..=100
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub result: Option<AnalysisReport>,
    pub error: Option<ErrorInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory registry of analysis jobs
///
/// Records live for the retention window counted from creation and are swept
/// lazily on `create` and `get`. Nothing survives a restart.
///
/// # Transitions
///
/// | From | Operation | To |
/// |------|-----------|----|
/// | pending, running | `update` | running |
/// | pending, running | `complete` | completed |
/// | pending, running | `fail` | failed |
/// | completed, failed | any | unchanged |
pub struct JobTracker {
    jobs: Mutex<HashMap<String, JobRecord>>,
    retention: Duration,
}

impl JobTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn from_config(config: &JobsConfig) -> Self {
        let hours = i64::try_from(config.retention_hours).unwrap_or(i64::MAX);
        Self::new(Duration::try_hours(hours).unwrap_or(Duration::MAX))
    }

    // Records stay consistent across a panicking holder: every mutation is a
    // plain field assignment.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep(&self, jobs: &mut HashMap<String, JobRecord>, now: DateTime<Utc>) {
        let before = jobs.len();
        jobs.retain(|_, record| now.signed_duration_since(record.created_at) < self.retention);
        let removed = before - jobs.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = jobs.len(), "Swept expired jobs");
        }
    }

    /// Registers a pending job and returns its id
    pub fn create(&self) -> String {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let mut jobs = self.lock();
        self.sweep(&mut jobs, now);
        jobs.insert(id.clone(), JobRecord::new(id.clone(), now));

        tracing::debug!(job_id = %id, "Job created");
        id
    }

    /// Records progress for an active job
    ///
    /// Returns false when the job is unknown or already terminal.
    pub fn update(&self, id: &str, phase: u8, message: &str, percent: u8) -> bool {
        let mut jobs = self.lock();
        let Some(record) = jobs.get_mut(id) else {
            return false;
        };
        if record.status.is_terminal() {
            return false;
        }

        record.status = JobStatus::Running;
        record.phase = phase.clamp(1, TOTAL_PHASES);
        record.percent = percent.min(100);
        record.message = message.to_string();
        record.updated_at = Utc::now();
        true
    }

    /// Marks a job completed with its report
    pub fn complete(&self, id: &str, report: AnalysisReport) -> Result<(), JobError> {
        self.finish(id, JobStatus::Completed, |record| {
            record.phase = TOTAL_PHASES;
            record.percent = 100;
            record.message = "Analysis complete".to_string();
            record.result = Some(report);
        })
    }

    /// Marks a job failed with the error that ended it
    pub fn fail(&self, id: &str, error: ErrorInfo) -> Result<(), JobError> {
        self.finish(id, JobStatus::Failed, |record| {
            record.message = error.message.clone();
            record.error = Some(error);
        })
    }

    fn finish<F>(&self, id: &str, status: JobStatus, apply: F) -> Result<(), JobError>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.lock();
        let record = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        if record.status.is_terminal() {
            let current = record.status;
            drop(jobs);

            tracing::warn!(
                job_id = id,
                current = %current,
                requested = %status,
                "Ignoring transition out of a terminal state"
            );
            debug_assert!(
                !current.is_terminal(),
                "job {} is already {}, cannot become {}",
                id, current, status
            );
            return Err(JobError::AlreadyTerminal {
                id: id.to_string(),
                status: current,
            });
        }

        apply(record);
        record.status = status;
        record.updated_at = Utc::now();

        tracing::info!(job_id = id, status = %status, "Job finished");
        Ok(())
    }

    /// Returns a snapshot of the job, if it exists and has not expired
    pub fn get(&self, id: &str) -> Option<JobRecord> {
        let mut jobs = self.lock();
        self.sweep(&mut jobs, Utc::now());
        jobs.get(id).cloned()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a job and runs the pipeline for it in the background
    ///
    /// Returns as soon as the job is registered. Progress flows into
    /// [`update`](Self::update); the outcome into [`complete`](Self::complete)
    /// or [`fail`](Self::fail). A panicking run fails the job with an internal
    /// error instead of leaving it active.
    pub fn submit(self: &Arc<Self>, pipeline: Arc<Pipeline>, request: AnalysisRequest) -> String {
        let job_id = self.create();
        let tracker = Arc::clone(self);
        let id = job_id.clone();

        tokio::spawn(async move {
            let started = tokio::time::Instant::now();

            let run = {
                let tracker = Arc::clone(&tracker);
                let id = id.clone();
                tokio::spawn(async move {
                    let progress = |phase: u8, message: &str, percent: u8| {
                        tracker.update(&id, phase, message, percent);
                    };
                    pipeline.run_with_progress(&request, &progress).await
                })
            };

            let outcome = run.await.unwrap_or_else(|e| {
                Err(AnalyzerError::Internal(format!("analysis task failed: {}", e)))
            });

            let recorded = match outcome {
                Ok(report) => tracker.complete(&id, report),
                Err(err) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    tracker.fail(&id, ErrorInfo::from_error(&err, elapsed))
                }
            };
            if let Err(e) = recorded {
                tracing::warn!(job_id = %id, error = %e, "Could not record job outcome");
            }
        });

        job_id
    }

    #[cfg(test)]
    fn backdate(&self, id: &str, by: Duration) {
        if let Some(record) = self.lock().get_mut(id) {
            record.created_at = record.created_at - by;
        }
    }
}
