//! `ExecutionRecord`: the Script Executor's persisted state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::CoreError;
use crate::ids::{new_id, now};

/// `pending → running → (completed | failed | cancelled)`. Terminal states
/// are write-once (I5): once reached, no further mutation is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Exclusively owned by the Executor until it reaches a terminal status;
/// mutated only through [`ExecutionRecord::transition`], which enforces the
/// write-once-after-terminal invariant (I5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub script_id: String,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub return_code: Option<i32>,
    pub config: serde_json::Value,
    pub environment: HashMap<String, String>,
    pub logs: Vec<String>,
    pub artifacts: Vec<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn new(script_id: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            execution_id: new_id(),
            script_id: script_id.into(),
            status: ExecutionStatus::Pending,
            start_time: now(),
            end_time: None,
            duration_ms: None,
            return_code: None,
            config,
            environment: HashMap::new(),
            logs: Vec::new(),
            artifacts: Vec::new(),
            report_path: None,
            error: None,
        }
    }

    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Append a line to the in-flight log buffer. No-op (returns an error)
    /// once the record has reached a terminal status.
    pub fn append_log(&mut self, line: impl Into<String>) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::fatal(
                "cannot mutate an ExecutionRecord past its terminal status",
            ));
        }
        self.logs.push(line.into());
        Ok(())
    }

    pub fn mark_running(&mut self) -> Result<(), CoreError> {
        self.transition(ExecutionStatus::Running, None, None, None)
    }

    /// Move to a terminal status, stamping `end_time`/`duration_ms`. Returns
    /// an error if the record is already terminal (I5).
    pub fn transition(
        &mut self,
        status: ExecutionStatus,
        return_code: Option<i32>,
        report_path: Option<PathBuf>,
        error: Option<String>,
    ) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::fatal(format!(
                "ExecutionRecord {} is already terminal ({})",
                self.execution_id, self.status
            )));
        }
        self.status = status;
        if status.is_terminal() {
            let end = now();
            self.duration_ms = Some((end - self.start_time).num_milliseconds());
            self.end_time = Some(end);
        }
        if return_code.is_some() {
            self.return_code = return_code;
        }
        if report_path.is_some() {
            self.report_path = report_path;
        }
        if error.is_some() {
            self.error = error;
        }
        Ok(())
    }
}
