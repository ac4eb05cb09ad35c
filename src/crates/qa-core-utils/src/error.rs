//! The error taxonomy shared by every crate in the orchestration core.
//!
//! Every fallible operation in the core returns a [`CoreError`] (or a
//! crate-local error that converts into one at the boundary). Callers that
//! need to decide *policy* — retry, degrade, fail the request, or tear down
//! the runtime — do so by matching on [`ErrorKind`], never on the specific
//! variant, so that policy code and error construction can evolve
//! independently.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// The five error classes named in the orchestration core's error handling
/// design. Each carries a fixed retry/degrade/fail policy at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// RAG/LLM timeouts, subprocess I/O hiccups, transient 5xx from a
    /// controller. Retry with backoff only when known-safe; otherwise degrade.
    Transient,
    /// Unparseable document, bad JSON from an LLM, missing required keys.
    /// Converted to a warning on the output stream; never crashes the pipeline.
    InputMalformed,
    /// Sandbox concurrency full, disk full, dependency install failure.
    ResourceExhaustion,
    /// Missing workspace, missing model-client key with mock disabled,
    /// forbidden-only-sandbox without a sandbox. Fails the request terminally.
    Configuration,
    /// Bus shutting down, unrecoverable I/O in a critical path. Propagates to
    /// the runtime, which cancels every in-flight session.
    Fatal,
}

/// Errors that can occur anywhere in the orchestration core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transient error: {0}")]
    Transient(String),

    #[error("malformed input: {0}")]
    InputMalformed(String),

    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// The policy class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Transient(_) => ErrorKind::Transient,
            CoreError::InputMalformed(_) => ErrorKind::InputMalformed,
            CoreError::ResourceExhaustion(_) => ErrorKind::ResourceExhaustion,
            CoreError::Configuration(_) => ErrorKind::Configuration,
            CoreError::Fatal(_) => ErrorKind::Fatal,
            // A bad deserialization is almost always a malformed upstream
            // payload (LLM JSON, a persisted record); an unreadable file is
            // closer to a configuration problem than a runtime crash.
            CoreError::Serialization(_) => ErrorKind::InputMalformed,
            CoreError::Io(_) => ErrorKind::Configuration,
        }
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        CoreError::Transient(msg.into())
    }

    pub fn input_malformed(msg: impl Into<String>) -> Self {
        CoreError::InputMalformed(msg.into())
    }

    pub fn resource_exhaustion(msg: impl Into<String>) -> Self {
        CoreError::ResourceExhaustion(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        CoreError::Configuration(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        CoreError::Fatal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(CoreError::transient("x").kind(), ErrorKind::Transient);
        assert_eq!(
            CoreError::input_malformed("x").kind(),
            ErrorKind::InputMalformed
        );
        assert_eq!(
            CoreError::resource_exhaustion("x").kind(),
            ErrorKind::ResourceExhaustion
        );
        assert_eq!(
            CoreError::configuration("x").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(CoreError::fatal("x").kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_display() {
        let err = CoreError::configuration("missing workspace");
        assert!(err.to_string().contains("missing workspace"));
    }
}
