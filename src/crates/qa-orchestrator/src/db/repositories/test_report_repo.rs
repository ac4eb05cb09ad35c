//! Test report repository for database operations.

use crate::db::connection::DatabasePool;
use crate::db::models::TestReportRow;

pub struct TestReportRepository;

impl TestReportRepository {
    pub async fn insert(pool: &DatabasePool, row: &TestReportRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO test_reports
                (report_id, execution_id, script_id, status, total, passed, failed, skipped,
                 success_rate, start_time, end_time, duration_ms, report_path, report_url,
                 logs, screenshots, videos)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.report_id)
        .bind(&row.execution_id)
        .bind(&row.script_id)
        .bind(&row.status)
        .bind(row.total)
        .bind(row.passed)
        .bind(row.failed)
        .bind(row.skipped)
        .bind(row.success_rate)
        .bind(&row.start_time)
        .bind(&row.end_time)
        .bind(row.duration_ms)
        .bind(&row.report_path)
        .bind(&row.report_url)
        .bind(&row.logs)
        .bind(&row.screenshots)
        .bind(&row.videos)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_execution_id(
        pool: &DatabasePool,
        execution_id: &str,
    ) -> Result<Option<TestReportRow>, sqlx::Error> {
        sqlx::query_as::<_, TestReportRow>(
            "SELECT * FROM test_reports WHERE execution_id = ?",
        )
        .bind(execution_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_script(
        pool: &DatabasePool,
        script_id: &str,
    ) -> Result<Vec<TestReportRow>, sqlx::Error> {
        sqlx::query_as::<_, TestReportRow>(
            "SELECT * FROM test_reports WHERE script_id = ? ORDER BY start_time DESC",
        )
        .bind(script_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_utils::{ExecutionRecord, ExecutionStatus, TestReport, TestTotals};

    async fn setup_db() -> sqlx::sqlite::SqlitePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE test_reports (
                report_id TEXT PRIMARY KEY NOT NULL,
                execution_id TEXT NOT NULL,
                script_id TEXT NOT NULL,
                status TEXT NOT NULL,
                total INTEGER NOT NULL,
                passed INTEGER NOT NULL,
                failed INTEGER NOT NULL,
                skipped INTEGER NOT NULL,
                success_rate REAL NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration_ms INTEGER,
                report_path TEXT,
                report_url TEXT,
                logs TEXT NOT NULL,
                screenshots TEXT NOT NULL,
                videos TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_insert_then_get_by_execution_id() {
        let pool = setup_db().await;
        let mut record = ExecutionRecord::new("script-1", serde_json::json!({}));
        record.mark_running().unwrap();
        record
            .transition(ExecutionStatus::Completed, Some(0), None, None)
            .unwrap();
        let report = TestReport::from_execution(&record, TestTotals { total: 2, passed: 2, failed: 0, skipped: 0 });
        let row = TestReportRow::from_report(&report);

        TestReportRepository::insert(&pool, &row).await.unwrap();

        let fetched = TestReportRepository::get_by_execution_id(&pool, &record.execution_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.passed, 2);
        assert!((fetched.success_rate - 1.0).abs() < f64::EPSILON);
    }
}
