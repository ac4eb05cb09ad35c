//! Script Generator: renders test cases into one script artifact (single-file
//! mode) plus a requirements descriptor, and kicks off execution.
//!
//! Grounded on `original_source/.../script_generator_agent.py`'s single-file
//! pytest rendering.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use qa_core_agent_runtime::{Agent, AgentResult};
use qa_core_bus::SharedBus;
use qa_core_llm::ChatModel;
use qa_core_utils::{
    AgentType, ExecutionConfig, ExecutionInput, MessageContext, RequirementsDescriptor,
    ScriptArtifact, ScriptGenerationOutput, TestCase, TestCaseGenerationOutput, TopicType,
    TypedMessage,
};

use crate::base_agent::BaseAgent;

pub struct ScriptGeneratorAgent {
    base: BaseAgent,
}

impl ScriptGeneratorAgent {
    pub fn new(bus: SharedBus, model_client: Box<dyn ChatModel>) -> Self {
        Self {
            base: BaseAgent::new(AgentType::ScriptGenerator, bus, model_client),
        }
    }

    fn render_test_function(case: &TestCase) -> String {
        let assertion_lines: String = case
            .assertions
            .iter()
            .map(|a| format!("    # assert {} == {}", a.kind, a.expected))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "def test_{}():\n    \"\"\"endpoint #{} — {:?}\"\"\"\n{}\n    pass\n",
            case.test_case_id.replace('-', "_"),
            case.endpoint_index,
            case.kind,
            assertion_lines
        )
    }

    /// Render every test case into one script body. Single-file mode by
    /// default (spec.md §4.6); multi-file rendering is a Non-goal.
    pub fn generate(&self, generation: &TestCaseGenerationOutput) -> ScriptGenerationOutput {
        let mut body = String::from("import pytest\n\n");
        for case in &generation.test_cases {
            body.push_str(&Self::render_test_function(case));
            body.push('\n');
        }

        let script = ScriptArtifact {
            name: "test_generated.py".to_string(),
            relative_path: "test_generated.py".to_string(),
            content: body,
            dependencies: vec!["pytest".to_string(), "requests".to_string()],
            test_case_ids: generation.test_cases.iter().map(|c| c.test_case_id.clone()).collect(),
            framework: "pytest".to_string(),
        };

        ScriptGenerationOutput {
            scripts: vec![script],
            requirements: RequirementsDescriptor {
                packages: vec!["pytest".to_string(), "requests".to_string(), "pytest-json-report".to_string()],
                lockfile_name: None,
            },
        }
    }

    /// Stream a one-line narration of the rendered script through the model
    /// client (spec.md §4.4), mirroring the "intelligent generation" LLM pass
    /// in `original_source/.../script_generator_agent.py`. The deterministic
    /// rendering above remains authoritative; failure here is logged and
    /// otherwise ignored.
    async fn narrate(&self, ctx: &MessageContext, output: &ScriptGenerationOutput) {
        let task_prompt = format!(
            "Summarize in one sentence: generated {} script(s) covering {} test case ids, requiring packages {:?}.",
            output.scripts.len(),
            output.scripts.iter().map(|s| s.test_case_ids.len()).sum::<usize>(),
            output.requirements.packages
        );
        if let Err(err) = self.base.run_llm(ctx, "script_generator", task_prompt, true).await {
            tracing::debug!(error = %err, "script generator narration failed, continuing without it");
        }
    }
}

#[async_trait]
impl Agent for ScriptGeneratorAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::ScriptGenerator
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        let TypedMessage::ScriptGenerationInput { ctx, payload } = msg else {
            return Ok(());
        };
        let monitor = self.base.start_monitor();

        let output = self.generate(&payload);
        self.narrate(&ctx, &output).await;

        self.base
            .send_response(
                TopicType::ScriptGenerationOutput,
                &ctx,
                TypedMessage::ScriptGenerationOutput {
                    ctx: ctx.clone(),
                    payload: output.clone(),
                },
            )
            .await?;

        self.base
            .send_response(
                TopicType::PersistenceRequest,
                &ctx,
                TypedMessage::ScriptGenerationOutput {
                    ctx: ctx.propagate("script_generator"),
                    payload: output.clone(),
                },
            )
            .await?;

        self.base
            .send_response(
                TopicType::ExecutionRequest,
                &ctx,
                TypedMessage::ExecutionInput {
                    ctx: ctx.propagate("script_generator"),
                    payload: ExecutionInput {
                        scripts: output.scripts,
                        config: ExecutionConfig {
                            runner_args: Vec::new(),
                            env: HashMap::new(),
                            timeout_secs: None,
                            ui_mode: false,
                        },
                    },
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
    use qa_core_utils::{Assertion, CoverageReport, TestCaseKind};
    use serde_json::{Map, Value};

    fn agent() -> ScriptGeneratorAgent {
        ScriptGeneratorAgent::new(Arc::new(qa_core_bus::MessageBus::new()), Box::new(MockChatModel::default()))
    }

    fn sample_case() -> TestCase {
        TestCase {
            test_case_id: "tc-0-positive".to_string(),
            endpoint_index: 0,
            kind: TestCaseKind::Positive,
            test_data: Map::new(),
            assertions: vec![Assertion { kind: "status-code".to_string(), expected: Value::from(200) }],
            setup: Vec::new(),
            cleanup: Vec::new(),
            priority: 1,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_generate_produces_one_artifact_with_all_test_ids() {
        let agent = agent();
        let generation = TestCaseGenerationOutput {
            test_cases: vec![sample_case()],
            coverage: CoverageReport::compute(1, 1),
        };
        let output = agent.generate(&generation);
        assert_eq!(output.scripts.len(), 1);
        assert_eq!(output.scripts[0].test_case_ids, vec!["tc-0-positive".to_string()]);
        assert!(output.scripts[0].content.contains("def test_tc_0_positive"));
    }

    #[test]
    fn test_generate_with_no_cases_still_produces_valid_artifact() {
        let agent = agent();
        let generation = TestCaseGenerationOutput {
            test_cases: Vec::new(),
            coverage: CoverageReport::compute(0, 0),
        };
        let output = agent.generate(&generation);
        assert_eq!(output.scripts.len(), 1);
        assert!(output.scripts[0].test_case_ids.is_empty());
    }
}
