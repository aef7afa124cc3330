//! Per-stage timing and soft performance thresholds

use crate::config::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use tokio::time::Instant;

/// One step of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Search,
    Fetch,
    Analyze,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Fetch => "fetch",
            Self::Analyze => "analyze",
        }
    }

    /// 1-based phase number reported to job progress
    pub fn phase(&self) -> u8 {
        match self {
            Self::Search => 1,
            Self::Fetch => 2,
            Self::Analyze => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Elapsed seconds per completed stage, plus the whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub stages: BTreeMap<Stage, f64>,
    pub total_seconds: f64,
}

impl StageTimings {
    pub fn get(&self, stage: Stage) -> Option<f64> {
        self.stages.get(&stage).copied()
    }
}

/// Records stage durations for one run
#[derive(Debug)]
pub struct StageTimer {
    started: Instant,
    timings: StageTimings,
}

impl StageTimer {
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started: Instant) -> Self {
        Self {
            started,
            timings: StageTimings::default(),
        }
    }

    /// Awaits `future` and records how long it took under `stage`
    pub async fn time<F: Future>(&mut self, stage: Stage, future: F) -> F::Output {
        let stage_start = Instant::now();
        let output = future.await;
        let elapsed = stage_start.elapsed().as_secs_f64();

        tracing::debug!(stage = %stage, elapsed_secs = elapsed, "Stage finished");
        self.timings.stages.insert(stage, elapsed);
        output
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn finish(mut self) -> StageTimings {
        self.timings.total_seconds = self.elapsed_secs();
        self.timings
    }
}

/// A stage or the total run that took longer than its soft limit
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBreach {
    pub name: &'static str,
    pub elapsed_secs: f64,
    pub limit_secs: f64,
}

/// Soft limits that only produce warnings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub search_secs: f64,
    pub fetch_secs: f64,
    pub analyze_secs: f64,
    pub total_secs: f64,
}

impl From<&PipelineConfig> for Thresholds {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            search_secs: config.search_threshold_secs,
            fetch_secs: config.fetch_threshold_secs,
            analyze_secs: config.analyze_threshold_secs,
            total_secs: config.total_threshold_secs,
        }
    }
}

impl Thresholds {
    fn limit(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Search => self.search_secs,
            Stage::Fetch => self.fetch_secs,
            Stage::Analyze => self.analyze_secs,
        }
    }

    pub fn breaches(&self, timings: &StageTimings) -> Vec<ThresholdBreach> {
        let mut breaches: Vec<ThresholdBreach> = timings
            .stages
            .iter()
            .filter(|(stage, elapsed)| **elapsed > self.limit(**stage))
            .map(|(stage, elapsed)| ThresholdBreach {
                name: stage.as_str(),
                elapsed_secs: *elapsed,
                limit_secs: self.limit(*stage),
            })
            .collect();

        if timings.total_seconds > self.total_secs {
            breaches.push(ThresholdBreach {
                name: "total",
                elapsed_secs: timings.total_seconds,
                limit_secs: self.total_secs,
            });
        }

        breaches
    }

    /// Logs one warning per breach and returns how many there were
    pub fn check(&self, timings: &StageTimings) -> usize {
        let breaches = self.breaches(timings);
        for breach in &breaches {
            tracing::warn!(
                stage = breach.name,
                elapsed_secs = breach.elapsed_secs,
                limit_secs = breach.limit_secs,
                "Performance threshold exceeded"
            );
        }
        breaches.len()
    }
}
