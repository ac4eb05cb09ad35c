//! Test report row for database persistence. Mirrors `qa_core_utils::TestReport`,
//! with `TestTotals` flattened into columns and path lists stored as JSON TEXT.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use qa_core_utils::TestReport;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestReportRow {
    pub report_id: String,
    pub execution_id: String,
    pub script_id: String,
    pub status: String,
    pub total: i64,
    pub passed: i64,
    pub failed: i64,
    pub skipped: i64,
    pub success_rate: f64,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_ms: Option<i64>,
    pub report_path: Option<String>,
    pub report_url: Option<String>,
    pub logs: String,
    pub screenshots: String,
    pub videos: String,
}

impl TestReportRow {
    pub fn from_report(report: &TestReport) -> Self {
        Self {
            report_id: report.report_id.clone(),
            execution_id: report.execution_id.clone(),
            script_id: report.script_id.clone(),
            status: report.status.to_string(),
            total: report.totals.total as i64,
            passed: report.totals.passed as i64,
            failed: report.totals.failed as i64,
            skipped: report.totals.skipped as i64,
            success_rate: report.success_rate,
            start_time: report.start_time.to_rfc3339(),
            end_time: report.end_time.map(|t| t.to_rfc3339()),
            duration_ms: report.duration_ms,
            report_path: report.report_path.as_ref().map(|p| p.display().to_string()),
            report_url: report.report_url.clone(),
            logs: serde_json::to_string(&report.logs).unwrap_or_default(),
            screenshots: serde_json::to_string(&report.screenshots).unwrap_or_default(),
            videos: serde_json::to_string(&report.videos).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_utils::{ExecutionRecord, ExecutionStatus, TestTotals};

    #[test]
    fn test_row_flattens_totals() {
        let mut record = ExecutionRecord::new("script-1", serde_json::json!({}));
        record.mark_running().unwrap();
        record
            .transition(ExecutionStatus::Completed, Some(0), None, None)
            .unwrap();
        let totals = TestTotals { total: 4, passed: 3, failed: 1, skipped: 0 };
        let report = TestReport::from_execution(&record, totals);

        let row = TestReportRow::from_report(&report);
        assert_eq!(row.total, 4);
        assert_eq!(row.passed, 3);
        assert_eq!(row.failed, 1);
        assert!((row.success_rate - 0.75).abs() < f64::EPSILON);
    }
}
