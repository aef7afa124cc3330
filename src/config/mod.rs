//! Configuration module for SEO Analyzer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use seo_analyzer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Search results per run: {}", config.search.result_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalysisConfig, CacheConfig, Config, FetchConfig, JobsConfig, PipelineConfig, SearchConfig,
    ServerConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, ANALYSIS_KEY_ENV,
    SEARCH_KEY_ENV,
};
