//! `PipelineSession`: the end-to-end progress tracker for one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{new_id, now};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Created => "created",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Created at ingestion, advanced as each agent writes a log record; the
/// terminal state is written by the final agent in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSession {
    pub session_id: String,
    pub workflow_type: String,
    pub status: SessionStatus,
    pub current_step: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl PipelineSession {
    pub fn new(workflow_type: impl Into<String>) -> Self {
        Self {
            session_id: new_id(),
            workflow_type: workflow_type.into(),
            status: SessionStatus::Created,
            current_step: "created".to_string(),
            start_time: now(),
            end_time: None,
            error: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Record that a given agent/step is now processing this session.
    pub fn advance(&mut self, step: impl Into<String>) {
        self.status = SessionStatus::Processing;
        self.current_step = step.into();
    }

    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        self.end_time = Some(now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.error = Some(error.into());
        self.end_time = Some(now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_then_complete() {
        let mut session = PipelineSession::new("api");
        session.advance("doc_parser");
        assert_eq!(session.status, SessionStatus::Processing);
        session.complete();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.end_time.is_some());
    }

    #[test]
    fn test_fail_sets_error() {
        let mut session = PipelineSession::new("ui");
        session.fail("sandbox unavailable");
        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(session.error.as_deref(), Some("sandbox unavailable"));
    }
}
