//! Execution record repository for database operations.

use crate::db::connection::DatabasePool;
use crate::db::models::ExecutionRecordRow;

pub struct ExecutionRecordRepository;

impl ExecutionRecordRepository {
    pub async fn upsert(pool: &DatabasePool, row: &ExecutionRecordRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO execution_records
                (execution_id, script_id, status, start_time, end_time, duration_ms,
                 return_code, config, environment, logs, artifacts, report_path, error)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(execution_id) DO UPDATE SET
                status = excluded.status,
                end_time = excluded.end_time,
                duration_ms = excluded.duration_ms,
                return_code = excluded.return_code,
                logs = excluded.logs,
                artifacts = excluded.artifacts,
                report_path = excluded.report_path,
                error = excluded.error",
        )
        .bind(&row.execution_id)
        .bind(&row.script_id)
        .bind(&row.status)
        .bind(&row.start_time)
        .bind(&row.end_time)
        .bind(row.duration_ms)
        .bind(row.return_code)
        .bind(&row.config)
        .bind(&row.environment)
        .bind(&row.logs)
        .bind(&row.artifacts)
        .bind(&row.report_path)
        .bind(&row.error)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(
        pool: &DatabasePool,
        execution_id: &str,
    ) -> Result<Option<ExecutionRecordRow>, sqlx::Error> {
        sqlx::query_as::<_, ExecutionRecordRow>(
            "SELECT * FROM execution_records WHERE execution_id = ?",
        )
        .bind(execution_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_script(
        pool: &DatabasePool,
        script_id: &str,
    ) -> Result<Vec<ExecutionRecordRow>, sqlx::Error> {
        sqlx::query_as::<_, ExecutionRecordRow>(
            "SELECT * FROM execution_records WHERE script_id = ? ORDER BY start_time DESC",
        )
        .bind(script_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &DatabasePool, execution_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM execution_records WHERE execution_id = ?")
            .bind(execution_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_utils::{ExecutionRecord, ExecutionStatus};

    async fn setup_db() -> sqlx::sqlite::SqlitePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE execution_records (
                execution_id TEXT PRIMARY KEY NOT NULL,
                script_id TEXT NOT NULL,
                status TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration_ms INTEGER,
                return_code INTEGER,
                config TEXT NOT NULL,
                environment TEXT NOT NULL,
                logs TEXT NOT NULL,
                artifacts TEXT NOT NULL,
                report_path TEXT,
                error TEXT
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let pool = setup_db().await;
        let mut record = ExecutionRecord::new("script-1", serde_json::json!({}));
        record.mark_running().unwrap();
        let row = ExecutionRecordRow::from_record(&record);

        ExecutionRecordRepository::upsert(&pool, &row).await.unwrap();
        let fetched = ExecutionRecordRepository::get_by_id(&pool, &record.execution_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.status, "running");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_updates_terminal_state() {
        let pool = setup_db().await;
        let mut record = ExecutionRecord::new("script-1", serde_json::json!({}));
        record.mark_running().unwrap();
        ExecutionRecordRepository::upsert(&pool, &ExecutionRecordRow::from_record(&record))
            .await
            .unwrap();

        record
            .transition(ExecutionStatus::Completed, Some(0), None, None)
            .unwrap();
        ExecutionRecordRepository::upsert(&pool, &ExecutionRecordRow::from_record(&record))
            .await
            .unwrap();

        let rows = ExecutionRecordRepository::list_by_script(&pool, "script-1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "completed");
    }
}
