//! Test Case Generator: turns an analyzed endpoint set into concrete test
//! cases (positive/negative/boundary/security/performance) plus a coverage
//! report.
//!
//! Grounded on `original_source/.../test_case_generator_agent.py`'s per-type
//! generation passes.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use qa_core_agent_runtime::{Agent, AgentResult};
use qa_core_bus::SharedBus;
use qa_core_llm::ChatModel;
use qa_core_utils::{
    AgentType, AnalysisOutput, Assertion, CoverageReport, MessageContext, TestCase,
    TestCaseGenerationOutput, TestCaseKind, TopicType, TypedMessage,
};

use crate::base_agent::BaseAgent;

pub struct TestCaseGeneratorAgent {
    base: BaseAgent,
}

impl TestCaseGeneratorAgent {
    pub fn new(bus: SharedBus, model_client: Box<dyn ChatModel>) -> Self {
        Self {
            base: BaseAgent::new(AgentType::TestCaseGenerator, bus, model_client),
        }
    }

    fn cases_for_endpoint(index: usize, path: &str, requires_auth: bool) -> Vec<TestCase> {
        let mut cases = Vec::new();

        cases.push(TestCase {
            test_case_id: format!("tc-{index}-positive"),
            endpoint_index: index,
            kind: TestCaseKind::Positive,
            test_data: Map::new(),
            assertions: vec![Assertion {
                kind: "status-code".to_string(),
                expected: Value::from(200),
            }],
            setup: Vec::new(),
            cleanup: Vec::new(),
            priority: 1,
            tags: vec!["smoke".to_string()],
        });

        cases.push(TestCase {
            test_case_id: format!("tc-{index}-negative"),
            endpoint_index: index,
            kind: TestCaseKind::Negative,
            test_data: Map::new(),
            assertions: vec![Assertion {
                kind: "status-code".to_string(),
                expected: Value::from(400),
            }],
            setup: Vec::new(),
            cleanup: Vec::new(),
            priority: 2,
            tags: Vec::new(),
        });

        if path.contains('{') {
            cases.push(TestCase {
                test_case_id: format!("tc-{index}-boundary"),
                endpoint_index: index,
                kind: TestCaseKind::Boundary,
                test_data: Map::new(),
                assertions: vec![Assertion {
                    kind: "status-code".to_string(),
                    expected: Value::from(404),
                }],
                setup: Vec::new(),
                cleanup: Vec::new(),
                priority: 3,
                tags: vec!["path-param".to_string()],
            });
        }

        if requires_auth {
            cases.push(TestCase {
                test_case_id: format!("tc-{index}-security"),
                endpoint_index: index,
                kind: TestCaseKind::Security,
                test_data: Map::new(),
                assertions: vec![Assertion {
                    kind: "status-code".to_string(),
                    expected: Value::from(401),
                }],
                setup: Vec::new(),
                cleanup: vec!["clear_auth_header".to_string()],
                priority: 1,
                tags: vec!["auth".to_string()],
            });
        }

        cases
    }

    pub fn generate(&self, analysis: &AnalysisOutput) -> TestCaseGenerationOutput {
        let mut test_cases = Vec::new();
        for (index, endpoint) in analysis.endpoints.iter().enumerate() {
            test_cases.extend(Self::cases_for_endpoint(index, &endpoint.path, endpoint.requires_auth));
        }

        let covered: std::collections::HashSet<usize> =
            test_cases.iter().map(|c| c.endpoint_index).collect();
        let coverage = CoverageReport::compute(analysis.endpoints.len(), covered.len());

        TestCaseGenerationOutput { test_cases, coverage }
    }

    /// Stream a one-line narration of the generated coverage through the
    /// model client (spec.md §4.4), mirroring the "intelligent generation"
    /// LLM pass in `original_source/.../test_case_generator_agent.py`. The
    /// deterministic per-type test cases above remain authoritative; failure
    /// here is logged and otherwise ignored.
    async fn narrate(&self, ctx: &MessageContext, output: &TestCaseGenerationOutput) {
        let task_prompt = format!(
            "Summarize in one sentence: {} test cases were generated covering {:.0}% of endpoints.",
            output.test_cases.len(),
            output.coverage.coverage_percentage
        );
        if let Err(err) = self.base.run_llm(ctx, "test_case_generator", task_prompt, true).await {
            tracing::debug!(error = %err, "test case generator narration failed, continuing without it");
        }
    }
}

#[async_trait]
impl Agent for TestCaseGeneratorAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::TestCaseGenerator
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        let TypedMessage::TestCaseGenerationInput { ctx, payload } = msg else {
            return Ok(());
        };
        let monitor = self.base.start_monitor();

        let output = self.generate(&payload);
        self.narrate(&ctx, &output).await;

        self.base
            .send_response(
                TopicType::TestCaseGenerationOutput,
                &ctx,
                TypedMessage::TestCaseGenerationOutput {
                    ctx: ctx.clone(),
                    payload: output.clone(),
                },
            )
            .await?;

        self.base
            .send_response(
                TopicType::ScriptGenerationRequest,
                &ctx,
                TypedMessage::ScriptGenerationInput {
                    ctx: ctx.propagate("test_case_generator"),
                    payload: output,
                },
            )
            .await?;

        self.base.end_monitor(monitor, true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_llm::remote::mock::MockChatModel;
    use qa_core_utils::ApiEndpoint;

    fn agent() -> TestCaseGeneratorAgent {
        TestCaseGeneratorAgent::new(Arc::new(qa_core_bus::MessageBus::new()), Box::new(MockChatModel::default()))
    }

    #[test]
    fn test_generates_boundary_case_for_path_param() {
        let cases = TestCaseGeneratorAgent::cases_for_endpoint(0, "/widgets/{id}", false);
        assert!(cases.iter().any(|c| c.kind == TestCaseKind::Boundary));
    }

    #[test]
    fn test_no_boundary_case_without_path_param() {
        let cases = TestCaseGeneratorAgent::cases_for_endpoint(0, "/widgets", false);
        assert!(!cases.iter().any(|c| c.kind == TestCaseKind::Boundary));
    }

    #[test]
    fn test_security_case_only_when_auth_required() {
        let cases = TestCaseGeneratorAgent::cases_for_endpoint(0, "/widgets", true);
        assert!(cases.iter().any(|c| c.kind == TestCaseKind::Security));
    }

    #[test]
    fn test_empty_endpoints_yields_zeroed_coverage() {
        let agent = agent();
        let analysis = AnalysisOutput {
            endpoints: Vec::new(),
            dependencies: Vec::new(),
            execution_plan: Vec::new(),
            risk_assessment: String::new(),
            test_strategy: String::new(),
            rag_enriched: false,
        };
        let output = agent.generate(&analysis);
        assert!(output.test_cases.is_empty());
        assert_eq!(output.coverage.coverage_percentage, 0.0);
    }

    #[test]
    fn test_full_coverage_when_every_endpoint_yields_cases() {
        let agent = agent();
        let analysis = AnalysisOutput {
            endpoints: vec![ApiEndpoint::new("/a", "GET"), ApiEndpoint::new("/b", "GET")],
            dependencies: Vec::new(),
            execution_plan: Vec::new(),
            risk_assessment: String::new(),
            test_strategy: String::new(),
            rag_enriched: false,
        };
        let output = agent.generate(&analysis);
        assert_eq!(output.coverage.coverage_percentage, 100.0);
    }
}
