//! Payload structs carried by each `TypedMessage` variant.
//!
//! These mirror the per-agent contracts in spec.md §4.6, supplemented per
//! `original_source/.../api_doc_parser_agent.py` and `api_analyzer_agent.py`
//! with `ApiEndpoint::extended_info` and `ParseOutput::warnings`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One documented API operation, normalised away from whichever source
/// format (OpenAPI, Swagger, Postman) it was parsed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<Value>,
    #[serde(default)]
    pub responses: Map<String, Value>,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    /// Provider-specific OpenAPI extensions (`x-*` fields), preserved so
    /// downstream agents can consult vendor metadata the normalised shape
    /// above does not otherwise carry.
    #[serde(default)]
    pub extended_info: Map<String, Value>,
}

impl ApiEndpoint {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            parameters: Vec::new(),
            responses: Map::new(),
            requires_auth: false,
            tags: Vec::new(),
            deprecated: false,
            extended_info: Map::new(),
        }
    }

    pub fn with_requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Which source document format the Doc Parser detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Auto,
    OpenApi,
    Swagger,
    Postman,
    Pdf,
    Unknown,
}

/// Output of the Doc Parser agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutput {
    pub api_info: Map<String, Value>,
    pub endpoints: Vec<ApiEndpoint>,
    pub format: DocumentFormat,
    /// 0.0–1.0; low for malformed/unrecognised input, never a hard failure.
    pub confidence_score: f64,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Distinct from `errors`: warnings never lower `confidence_score`.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ParseOutput {
    pub fn empty(format: DocumentFormat) -> Self {
        Self {
            api_info: Map::new(),
            endpoints: Vec::new(),
            format,
            confidence_score: 0.0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn low_confidence(format: DocumentFormat, error: impl Into<String>) -> Self {
        let mut out = Self::empty(format);
        out.confidence_score = 0.1;
        out.errors.push(error.into());
        out
    }
}

/// How one endpoint depends on another in the Analyzer's dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyEdgeKind {
    Sequence,
    Auth,
    Data,
    Business,
    Functional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: usize,
    pub to: usize,
    pub kind: DependencyEdgeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPhase {
    pub name: String,
    /// Indices into the analyzed endpoint list that may run concurrently
    /// within this phase.
    pub parallel_group: Vec<usize>,
}

/// Output of the Analyzer agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub endpoints: Vec<ApiEndpoint>,
    pub dependencies: Vec<DependencyEdge>,
    pub execution_plan: Vec<ExecutionPhase>,
    pub risk_assessment: String,
    pub test_strategy: String,
    /// `true` when a RAG context lookup actually enriched this output;
    /// `false` on degrade (RAG unavailable or failed).
    pub rag_enriched: bool,
}

/// A single test case emitted by the Test Case Generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseKind {
    Positive,
    Negative,
    Boundary,
    Security,
    Performance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    pub kind: String,
    pub expected: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub test_case_id: String,
    pub endpoint_index: usize,
    pub kind: TestCaseKind,
    pub test_data: Map<String, Value>,
    pub assertions: Vec<Assertion>,
    pub setup: Vec<String>,
    pub cleanup: Vec<String>,
    pub priority: u8,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub total_endpoints: usize,
    pub covered_endpoints: usize,
    pub coverage_percentage: f64,
}

impl CoverageReport {
    /// Boundary behaviour B1: an empty endpoint list yields a zeroed report,
    /// not a division-by-zero panic.
    pub fn compute(total_endpoints: usize, covered_endpoints: usize) -> Self {
        let coverage_percentage = if total_endpoints == 0 {
            0.0
        } else {
            (covered_endpoints as f64 / total_endpoints as f64) * 100.0
        };
        Self {
            total_endpoints,
            covered_endpoints,
            coverage_percentage,
        }
    }
}

/// Output of the Test Case Generator agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseGenerationOutput {
    pub test_cases: Vec<TestCase>,
    pub coverage: CoverageReport,
}

/// One generated script artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptArtifact {
    pub name: String,
    pub relative_path: String,
    pub content: String,
    pub dependencies: Vec<String>,
    pub test_case_ids: Vec<String>,
    pub framework: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementsDescriptor {
    pub packages: Vec<String>,
    pub lockfile_name: Option<String>,
}

/// Output of the Script Generator (and, for the UI pipeline, the Yaml
/// Generator) agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptGenerationOutput {
    pub scripts: Vec<ScriptArtifact>,
    pub requirements: RequirementsDescriptor,
}

/// Config passed into an ExecutionRequest: runner args, env overrides, and
/// the workspace-relative script to execute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub runner_args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
    /// Set only for the UI pipeline; requests a Browser Sandbox profile.
    #[serde(default)]
    pub ui_mode: bool,
}

/// Severity of a `LogRecord`, ordered so `>=` comparisons match spec.md's
/// "severity ≥ error" trigger condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub session_id: String,
    pub source: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_report_empty_endpoints() {
        let report = CoverageReport::compute(0, 0);
        assert_eq!(report.total_endpoints, 0);
        assert_eq!(report.coverage_percentage, 0.0);
    }

    #[test]
    fn test_coverage_report_partial() {
        let report = CoverageReport::compute(4, 2);
        assert_eq!(report.coverage_percentage, 50.0);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error >= LogLevel::Error);
        assert!(LogLevel::Critical > LogLevel::Error);
        assert!(LogLevel::Info < LogLevel::Error);
    }

    #[test]
    fn test_low_confidence_parse_output() {
        let out = ParseOutput::low_confidence(DocumentFormat::Unknown, "not json");
        assert!(out.confidence_score <= 0.5);
        assert_eq!(out.errors.len(), 1);
    }
}
