//! `AgentType` and `TopicType`: the enumerated tags the bus and runtime route on.
//!
//! Mirrors the teacher's `TaskStatus` pattern (a plain `Copy` enum with
//! `Display`, here extended with `FromStr` since topic names round-trip
//! through configuration and logging).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a pipeline stage's role. Invariant: each agent instance has
/// exactly one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    DocParser,
    Analyzer,
    TestCaseGenerator,
    ScriptGenerator,
    Persistence,
    Executor,
    LogRecorder,
    YamlGenerator,
    PlaywrightExecutor,
    StreamCollector,
}

impl AgentType {
    pub const ALL: &'static [AgentType] = &[
        AgentType::DocParser,
        AgentType::Analyzer,
        AgentType::TestCaseGenerator,
        AgentType::ScriptGenerator,
        AgentType::Persistence,
        AgentType::Executor,
        AgentType::LogRecorder,
        AgentType::YamlGenerator,
        AgentType::PlaywrightExecutor,
        AgentType::StreamCollector,
    ];

    /// The topic this agent type subscribes to in the default wiring.
    /// Invariant (spec.md §3): no two agent types share a topic.
    pub fn canonical_topic(&self) -> TopicType {
        match self {
            AgentType::DocParser => TopicType::ParseRequest,
            AgentType::Analyzer => TopicType::AnalysisRequest,
            AgentType::TestCaseGenerator => TopicType::TestCaseGenerationRequest,
            AgentType::ScriptGenerator => TopicType::ScriptGenerationRequest,
            AgentType::Persistence => TopicType::PersistenceRequest,
            AgentType::Executor => TopicType::ExecutionRequest,
            AgentType::LogRecorder => TopicType::LogRecord,
            AgentType::YamlGenerator => TopicType::YamlGenerationRequest,
            AgentType::PlaywrightExecutor => TopicType::PlaywrightExecutionRequest,
            AgentType::StreamCollector => TopicType::StreamOutput,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentType::DocParser => "doc_parser",
            AgentType::Analyzer => "analyzer",
            AgentType::TestCaseGenerator => "test_case_generator",
            AgentType::ScriptGenerator => "script_generator",
            AgentType::Persistence => "persistence",
            AgentType::Executor => "executor",
            AgentType::LogRecorder => "log_recorder",
            AgentType::YamlGenerator => "yaml_generator",
            AgentType::PlaywrightExecutor => "playwright_executor",
            AgentType::StreamCollector => "stream_collector",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doc_parser" => Ok(AgentType::DocParser),
            "analyzer" => Ok(AgentType::Analyzer),
            "test_case_generator" => Ok(AgentType::TestCaseGenerator),
            "script_generator" => Ok(AgentType::ScriptGenerator),
            "persistence" => Ok(AgentType::Persistence),
            "executor" => Ok(AgentType::Executor),
            "log_recorder" => Ok(AgentType::LogRecorder),
            "yaml_generator" => Ok(AgentType::YamlGenerator),
            "playwright_executor" => Ok(AgentType::PlaywrightExecutor),
            "stream_collector" => Ok(AgentType::StreamCollector),
            other => Err(format!("unknown agent type: {other}")),
        }
    }
}

/// A routing key on the message bus. Invariant: every agent subscribes to
/// exactly one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    ParseRequest,
    ParseOutput,
    AnalysisRequest,
    AnalysisOutput,
    TestCaseGenerationRequest,
    TestCaseGenerationOutput,
    ScriptGenerationRequest,
    ScriptGenerationOutput,
    PersistenceRequest,
    ExecutionRequest,
    ExecutionOutput,
    LogRecord,
    YamlGenerationRequest,
    PlaywrightExecutionRequest,
    StreamOutput,
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TopicType::ParseRequest => "parse_request",
            TopicType::ParseOutput => "parse_output",
            TopicType::AnalysisRequest => "analysis_request",
            TopicType::AnalysisOutput => "analysis_output",
            TopicType::TestCaseGenerationRequest => "test_case_generation_request",
            TopicType::TestCaseGenerationOutput => "test_case_generation_output",
            TopicType::ScriptGenerationRequest => "script_generation_request",
            TopicType::ScriptGenerationOutput => "script_generation_output",
            TopicType::PersistenceRequest => "persistence_request",
            TopicType::ExecutionRequest => "execution_request",
            TopicType::ExecutionOutput => "execution_output",
            TopicType::LogRecord => "log_record",
            TopicType::YamlGenerationRequest => "yaml_generation_request",
            TopicType::PlaywrightExecutionRequest => "playwright_execution_request",
            TopicType::StreamOutput => "stream_output",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for t in AgentType::ALL {
            let s = t.to_string();
            let parsed: AgentType = s.parse().unwrap();
            assert_eq!(*t, parsed);
        }
    }

    #[test]
    fn test_canonical_topics_distinct() {
        let mut topics: Vec<TopicType> = AgentType::ALL.iter().map(|a| a.canonical_topic()).collect();
        let before = topics.len();
        topics.sort_by_key(|t| t.to_string());
        topics.dedup_by_key(|t| t.to_string());
        assert_eq!(before, topics.len(), "no two agent types may share a topic");
    }

    #[test]
    fn test_unknown_agent_type_rejected() {
        assert!("bogus".parse::<AgentType>().is_err());
    }
}
