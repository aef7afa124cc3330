//! Pipeline orchestration
//!
//! [`Pipeline`] sequences the search, fetch and analysis stages for one
//! request, timing each stage and reporting progress to a
//! [`ProgressReporter`].

mod orchestrator;
mod progress;
mod timing;

pub use orchestrator::{fetchable_urls, Pipeline};
pub use progress::{NoProgress, ProgressReporter};
pub use timing::{Stage, StageTimer, StageTimings, ThresholdBreach, Thresholds};
