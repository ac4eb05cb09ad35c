//! Canonical data model for the multi-agent orchestration core.
//!
//! Every entity named in the core's data model — the message envelope, the
//! per-pipeline-stage payloads, and the persisted execution/report/session
//! records — lives here so that `qa-core-bus`, `qa-core-agent-runtime`,
//! `qa-core-agents` and `qa-core-executor` all speak the same types instead
//! of each defining their own.

pub mod agent_type;
pub mod browser;
pub mod context;
pub mod error;
pub mod execution;
pub mod ids;
pub mod message;
pub mod payloads;
pub mod report;
pub mod session;

pub use agent_type::{AgentType, TopicType};
pub use browser::{BrowserProfile, ConcurrencySlot, ProxyConfig, WindowBounds};
pub use context::MessageContext;
pub use error::{CoreError, ErrorKind, Result};
pub use execution::{ExecutionRecord, ExecutionStatus};
pub use ids::{new_id, now};
pub use message::{ExecutionInput, ParseInput, StreamResponse, TypedMessage};
pub use payloads::{
    AnalysisOutput, ApiEndpoint, Assertion, CoverageReport, DependencyEdge, DependencyEdgeKind,
    DocumentFormat, ExecutionConfig, ExecutionPhase, LogLevel, LogRecord, ParseOutput,
    RequirementsDescriptor, ScriptArtifact, ScriptGenerationOutput, TestCase,
    TestCaseGenerationOutput, TestCaseKind,
};
pub use report::{TestReport, TestTotals};
pub use session::{PipelineSession, SessionStatus};
