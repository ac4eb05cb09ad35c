//! Storage seam for the Persistence Agent. Kept trait-based so this crate
//! never pulls in a database driver directly — `qa-orchestrator` supplies the
//! sqlx-backed implementation, tests use the in-memory one below.

use async_trait::async_trait;
use parking_lot::Mutex;
use qa_core_utils::{CoreError, ExecutionRecord, ParseOutput, ScriptGenerationOutput, TestReport};

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn upsert_parse_output(&self, session_id: &str, output: &ParseOutput) -> Result<(), CoreError>;
    async fn upsert_script_output(
        &self,
        session_id: &str,
        output: &ScriptGenerationOutput,
    ) -> Result<(), CoreError>;
    /// Writes back the terminal `ExecutionRecord`/`TestReport` pair produced
    /// by a script execution (spec.md §6). Called before the executor
    /// publishes its terminal `ExecutionOutput`, so downstream consumers can
    /// rely on the record already being durable by the time they see it on
    /// the stream.
    async fn upsert_execution(
        &self,
        record: &ExecutionRecord,
        report: &TestReport,
    ) -> Result<(), CoreError>;
}

/// Reference implementation used by tests and by any binary that hasn't
/// wired up a real database yet. Persistence failures here are impossible by
/// construction, which is itself useful for isolating the agent's
/// non-aborting-on-error behaviour in tests.
#[derive(Default)]
pub struct InMemoryPersistenceStore {
    parse_outputs: Mutex<Vec<(String, ParseOutput)>>,
    script_outputs: Mutex<Vec<(String, ScriptGenerationOutput)>>,
    executions: Mutex<Vec<(ExecutionRecord, TestReport)>>,
}

impl InMemoryPersistenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_output_count(&self) -> usize {
        self.parse_outputs.lock().len()
    }

    pub fn script_output_count(&self) -> usize {
        self.script_outputs.lock().len()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.lock().len()
    }
}

#[async_trait]
impl PersistenceStore for InMemoryPersistenceStore {
    async fn upsert_parse_output(&self, session_id: &str, output: &ParseOutput) -> Result<(), CoreError> {
        let mut outputs = self.parse_outputs.lock();
        if let Some(existing) = outputs.iter_mut().find(|(id, _)| id == session_id) {
            existing.1 = output.clone();
        } else {
            outputs.push((session_id.to_string(), output.clone()));
        }
        Ok(())
    }

    async fn upsert_script_output(
        &self,
        session_id: &str,
        output: &ScriptGenerationOutput,
    ) -> Result<(), CoreError> {
        let mut outputs = self.script_outputs.lock();
        if let Some(existing) = outputs.iter_mut().find(|(id, _)| id == session_id) {
            existing.1 = output.clone();
        } else {
            outputs.push((session_id.to_string(), output.clone()));
        }
        Ok(())
    }

    async fn upsert_execution(
        &self,
        record: &ExecutionRecord,
        report: &TestReport,
    ) -> Result<(), CoreError> {
        let mut executions = self.executions.lock();
        if let Some(existing) = executions
            .iter_mut()
            .find(|(r, _)| r.execution_id == record.execution_id)
        {
            *existing = (record.clone(), report.clone());
        } else {
            executions.push((record.clone(), report.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_utils::DocumentFormat;

    #[tokio::test]
    async fn test_upsert_replaces_on_same_session() {
        let store = InMemoryPersistenceStore::new();
        store
            .upsert_parse_output("s1", &ParseOutput::empty(DocumentFormat::OpenApi))
            .await
            .unwrap();
        store
            .upsert_parse_output("s1", &ParseOutput::empty(DocumentFormat::Swagger))
            .await
            .unwrap();
        assert_eq!(store.parse_output_count(), 1);
    }

    #[tokio::test]
    async fn test_upsert_execution_replaces_on_same_execution_id() {
        let store = InMemoryPersistenceStore::new();
        let record = ExecutionRecord::new("script-1", serde_json::json!({}));
        let report = TestReport::from_execution(&record, qa_core_utils::TestTotals::default());

        store.upsert_execution(&record, &report).await.unwrap();
        store.upsert_execution(&record, &report).await.unwrap();

        assert_eq!(store.execution_count(), 1);
    }
}
