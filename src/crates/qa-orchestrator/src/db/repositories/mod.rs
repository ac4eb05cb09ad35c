//! Repository pattern implementations for database access
//!
//! Provides repository structs for managing database operations on the
//! three persisted entities: execution records, test reports, and pipeline
//! sessions.

pub mod execution_record_repo;
pub mod pipeline_session_repo;
pub mod test_report_repo;

pub use execution_record_repo::ExecutionRecordRepository;
pub use pipeline_session_repo::PipelineSessionRepository;
pub use test_report_repo::TestReportRepository;
