//! Request and report types exchanged with callers
//!
//! - [`RawAnalysisRequest`] is what arrives over the wire; [`AnalysisRequest`]
//!   only exists after validation
//! - [`AnalysisReport`] is the assembled result of one pipeline run
//! - [`ErrorInfo`] is the serializable form of every failure

mod report;
mod request;

pub use report::{AnalysisReport, ErrorInfo};
pub use request::{
    AnalysisOptions, AnalysisRequest, RawAnalysisRequest, MAX_AUDIENCE_CHARS, MAX_TOPIC_CHARS,
};
