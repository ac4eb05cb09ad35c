//! Orchestration surface tying the agent-runtime, bus, and domain agents
//! together behind a REST/WebSocket API: the process that owns the bus,
//! registers every agent with the runtime, and exposes the external
//! entry points a client submits work through.

pub mod api;
pub mod db;
pub mod entrypoints;
pub mod version;

use thiserror::Error;

/// Errors surfaced at the orchestrator's own boundary: submitting work,
/// wiring agents, or talking to the database. Agent-internal errors never
/// reach here — they stay on the bus as `StreamResponse` output or in
/// `AgentHealth`, per the runtime's own error handling.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("bus error: {0}")]
    Bus(#[from] qa_core_bus::BusError),

    #[error("database error: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
