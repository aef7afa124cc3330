//! Report generation
//!
//! This module turns search results and fetched pages into the final report:
//! - Prompt assembly and work-unit size budgeting ([`prompt`])
//! - Provider abstraction and the chat completions client ([`provider`])
//! - Retry and output normalization around one generation ([`AnalysisClient`])

mod client;
pub mod normalize;
pub mod prompt;
pub mod provider;

pub use client::{AnalysisClient, AnalysisOutcome};
pub use provider::{ChatCompletionsProvider, Generation, GenerationProvider, GenerationRequest};
