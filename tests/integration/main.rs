//! Integration tests for the analysis pipeline
//!
//! These tests use wiremock to stand in for the search provider, the
//! competitor pages and the generation provider, and drive the pipeline, the
//! job tracker and the HTTP API end-to-end.

mod common;
mod job_tests;
mod pipeline_tests;
mod server_tests;
