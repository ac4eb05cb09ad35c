//! `TestReport`: the always-emitted summary derived from an `ExecutionRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::execution::{ExecutionRecord, ExecutionStatus};
use crate::ids::new_id;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TestTotals {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl TestTotals {
    /// Boundary behaviour B2: a script producing zero results yields all-zero
    /// totals and a `success_rate` of exactly `0.0`, never `NaN`.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub report_id: String,
    pub execution_id: String,
    pub script_id: String,
    pub status: ExecutionStatus,
    pub totals: TestTotals,
    pub success_rate: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub report_path: Option<PathBuf>,
    pub report_url: Option<String>,
    pub logs: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub videos: Vec<PathBuf>,
}

impl TestReport {
    /// Derive a report from a terminal `ExecutionRecord`; always succeeds,
    /// even for a failed or cancelled execution — a report is always
    /// emitted, with totals possibly zero.
    pub fn from_execution(record: &ExecutionRecord, totals: TestTotals) -> Self {
        let screenshots = record
            .artifacts
            .iter()
            .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("png" | "jpg")))
            .cloned()
            .collect();
        let videos = record
            .artifacts
            .iter()
            .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("mp4" | "webm")))
            .cloned()
            .collect();

        Self {
            report_id: new_id(),
            execution_id: record.execution_id.clone(),
            script_id: record.script_id.clone(),
            status: record.status,
            success_rate: totals.success_rate(),
            totals,
            start_time: record.start_time,
            end_time: record.end_time,
            duration_ms: record.duration_ms,
            report_path: record.report_path.clone(),
            report_url: None,
            logs: record.logs.clone(),
            screenshots,
            videos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_results_success_rate_is_zero_not_nan() {
        let totals = TestTotals::default();
        assert_eq!(totals.success_rate(), 0.0);
    }

    #[test]
    fn test_report_always_emitted_for_failure() {
        let mut record = ExecutionRecord::new("s1", serde_json::json!({}));
        record.mark_running().unwrap();
        record
            .transition(ExecutionStatus::Failed, Some(1), None, Some("crash".into()))
            .unwrap();
        let report = TestReport::from_execution(&record, TestTotals::default());
        assert_eq!(report.totals.total, 0);
        assert_eq!(report.success_rate, 0.0);
        assert!(matches!(report.status, ExecutionStatus::Failed));
    }
}
