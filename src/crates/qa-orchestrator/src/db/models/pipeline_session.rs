//! Pipeline session row for database persistence. Mirrors
//! `qa_core_utils::PipelineSession` directly, one column per field.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use qa_core_utils::PipelineSession;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PipelineSessionRow {
    pub session_id: String,
    pub workflow_type: String,
    pub status: String,
    pub current_step: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub error: Option<String>,
}

impl PipelineSessionRow {
    pub fn from_session(session: &PipelineSession) -> Self {
        Self {
            session_id: session.session_id.clone(),
            workflow_type: session.workflow_type.clone(),
            status: session.status.to_string(),
            current_step: session.current_step.clone(),
            start_time: session.start_time.to_rfc3339(),
            end_time: session.end_time.map(|t| t.to_rfc3339()),
            error: session.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_carries_workflow_type() {
        let mut session = PipelineSession::new("api");
        session.advance("doc_parser");
        let row = PipelineSessionRow::from_session(&session);
        assert_eq!(row.workflow_type, "api");
        assert_eq!(row.current_step, "doc_parser");
        assert_eq!(row.status, "processing");
    }
}
