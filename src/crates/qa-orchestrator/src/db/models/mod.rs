//! Database models
//!
//! Core data models for persistent storage in the orchestrator database.
//! All timestamp fields are stored as ISO8601 strings (TEXT in SQLite) due to
//! sqlx and SQLite type limitations with chrono::DateTime<Utc>.

pub mod execution_record;
pub mod pipeline_session;
pub mod test_report;

pub use execution_record::ExecutionRecordRow;
pub use pipeline_session::PipelineSessionRow;
pub use test_report::TestReportRow;
