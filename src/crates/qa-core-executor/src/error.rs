//! Executor-specific error type; converts into [`qa_core_utils::CoreError`]
//! at call sites that need the shared policy taxonomy.

use qa_core_utils::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("workspace preparation failed: {0}")]
    Workspace(String),

    #[error("process launch failed: {0}")]
    Launch(String),

    #[error("no sandbox slot available")]
    SandboxExhausted,

    #[error("sandbox controller error: {0}")]
    SandboxController(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExecutorError> for CoreError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Workspace(_) | ExecutorError::Io(_) => {
                CoreError::configuration(err.to_string())
            }
            ExecutorError::Launch(_) => CoreError::transient(err.to_string()),
            ExecutorError::SandboxExhausted => CoreError::resource_exhaustion(err.to_string()),
            ExecutorError::SandboxController(_) => CoreError::transient(err.to_string()),
        }
    }
}
