//! Pipeline session repository for database operations.

use crate::db::connection::DatabasePool;
use crate::db::models::PipelineSessionRow;

pub struct PipelineSessionRepository;

impl PipelineSessionRepository {
    pub async fn upsert(pool: &DatabasePool, row: &PipelineSessionRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO pipeline_sessions
                (session_id, workflow_type, status, current_step, start_time, end_time, error)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(session_id) DO UPDATE SET
                status = excluded.status,
                current_step = excluded.current_step,
                end_time = excluded.end_time,
                error = excluded.error",
        )
        .bind(&row.session_id)
        .bind(&row.workflow_type)
        .bind(&row.status)
        .bind(&row.current_step)
        .bind(&row.start_time)
        .bind(&row.end_time)
        .bind(&row.error)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(
        pool: &DatabasePool,
        session_id: &str,
    ) -> Result<Option<PipelineSessionRow>, sqlx::Error> {
        sqlx::query_as::<_, PipelineSessionRow>(
            "SELECT * FROM pipeline_sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_status(
        pool: &DatabasePool,
        status: &str,
    ) -> Result<Vec<PipelineSessionRow>, sqlx::Error> {
        sqlx::query_as::<_, PipelineSessionRow>(
            "SELECT * FROM pipeline_sessions WHERE status = ? ORDER BY start_time DESC",
        )
        .bind(status)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_utils::PipelineSession;

    async fn setup_db() -> sqlx::sqlite::SqlitePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE pipeline_sessions (
                session_id TEXT PRIMARY KEY NOT NULL,
                workflow_type TEXT NOT NULL,
                status TEXT NOT NULL,
                current_step TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                error TEXT
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_upsert_then_advance() {
        let pool = setup_db().await;
        let mut session = PipelineSession::new("api");
        PipelineSessionRepository::upsert(&pool, &PipelineSessionRow::from_session(&session))
            .await
            .unwrap();

        session.advance("script_generator");
        PipelineSessionRepository::upsert(&pool, &PipelineSessionRow::from_session(&session))
            .await
            .unwrap();

        let fetched = PipelineSessionRepository::get_by_id(&pool, &session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.current_step, "script_generator");
        assert_eq!(fetched.status, "processing");
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let pool = setup_db().await;
        let mut completed = PipelineSession::new("ui");
        completed.complete();
        PipelineSessionRepository::upsert(&pool, &PipelineSessionRow::from_session(&completed))
            .await
            .unwrap();

        let pending = PipelineSession::new("api");
        PipelineSessionRepository::upsert(&pool, &PipelineSessionRow::from_session(&pending))
            .await
            .unwrap();

        let completed_rows = PipelineSessionRepository::list_by_status(&pool, "completed")
            .await
            .unwrap();
        assert_eq!(completed_rows.len(), 1);
    }
}
