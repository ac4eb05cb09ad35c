//! Analyzer: builds a dependency graph and execution plan over parsed
//! endpoints, enriched by an optional RAG lookup that degrades gracefully.
//!
//! Grounded on `original_source/.../api_analyzer_agent.py`'s
//! `_build_dependency_graph`/`_topological_sort`/`_assess_testing_risks`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use qa_core_agent_runtime::{Agent, AgentResult};
use qa_core_bus::SharedBus;
use qa_core_llm::ChatModel;
use qa_core_utils::{
    AgentType, AnalysisOutput, ApiEndpoint, DependencyEdge, DependencyEdgeKind, ExecutionPhase,
    MessageContext, ParseOutput, TopicType, TypedMessage,
};

use crate::base_agent::BaseAgent;
use crate::rag::{NoRagClient, RagClient};

pub struct AnalyzerAgent {
    base: BaseAgent,
    rag: Arc<dyn RagClient>,
}

impl AnalyzerAgent {
    pub fn new(bus: SharedBus, model_client: Box<dyn ChatModel>) -> Self {
        Self::with_rag(bus, model_client, Arc::new(NoRagClient))
    }

    pub fn with_rag(bus: SharedBus, model_client: Box<dyn ChatModel>, rag: Arc<dyn RagClient>) -> Self {
        Self {
            base: BaseAgent::new(AgentType::Analyzer, bus, model_client),
            rag,
        }
    }

    /// Typed-edge dependency inference: a path segment repeated with a path
    /// parameter earlier in the list implies a sequence dependency (create
    /// before read/update/delete); any endpoint declaring auth implies every
    /// other endpoint on the same resource has an auth dependency on it.
    fn infer_dependencies(endpoints: &[ApiEndpoint]) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();

        let resource_of = |path: &str| -> String {
            path.split('/')
                .find(|seg| !seg.is_empty() && !seg.starts_with('{'))
                .unwrap_or("")
                .to_string()
        };

        let mut creators: HashMap<String, usize> = HashMap::new();
        for (idx, endpoint) in endpoints.iter().enumerate() {
            if endpoint.method.eq_ignore_ascii_case("POST") {
                creators.entry(resource_of(&endpoint.path)).or_insert(idx);
            }
        }

        for (idx, endpoint) in endpoints.iter().enumerate() {
            let resource = resource_of(&endpoint.path);
            if matches!(endpoint.method.to_ascii_uppercase().as_str(), "GET" | "PUT" | "PATCH" | "DELETE") {
                if let Some(&creator_idx) = creators.get(&resource) {
                    if creator_idx != idx {
                        edges.push(DependencyEdge {
                            from: creator_idx,
                            to: idx,
                            kind: DependencyEdgeKind::Sequence,
                        });
                    }
                }
            }
            if endpoint.requires_auth {
                for (other_idx, other) in endpoints.iter().enumerate() {
                    if other_idx != idx && resource_of(&other.path) == resource && !other.requires_auth {
                        edges.push(DependencyEdge {
                            from: idx,
                            to: other_idx,
                            kind: DependencyEdgeKind::Auth,
                        });
                    }
                }
            }
        }

        edges
    }

    /// Kahn's-algorithm topological layering: each phase is a set of
    /// endpoints with no unresolved dependency, so that within a phase the
    /// test runner may execute them in parallel.
    fn build_execution_plan(endpoints: &[ApiEndpoint], edges: &[DependencyEdge]) -> Vec<ExecutionPhase> {
        let n = endpoints.len();
        let mut indegree = vec![0usize; n];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in edges {
            adjacency[edge.from].push(edge.to);
            indegree[edge.to] += 1;
        }

        let mut remaining: HashSet<usize> = (0..n).collect();
        let mut phases = Vec::new();
        let mut phase_index = 0;

        while !remaining.is_empty() {
            let ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|idx| indegree[*idx] == 0)
                .collect();

            if ready.is_empty() {
                // Cycle: drain whatever remains into one final phase rather
                // than looping forever.
                let mut leftover: Vec<usize> = remaining.iter().copied().collect();
                leftover.sort_unstable();
                phases.push(ExecutionPhase {
                    name: format!("phase-{phase_index}"),
                    parallel_group: leftover,
                });
                break;
            }

            let mut ready_sorted = ready.clone();
            ready_sorted.sort_unstable();
            for &idx in &ready_sorted {
                remaining.remove(&idx);
                for &next in &adjacency[idx] {
                    if indegree[next] > 0 {
                        indegree[next] -= 1;
                    }
                }
            }
            phases.push(ExecutionPhase {
                name: format!("phase-{phase_index}"),
                parallel_group: ready_sorted,
            });
            phase_index += 1;
        }

        phases
    }

    fn assess_risk(endpoints: &[ApiEndpoint], edges: &[DependencyEdge]) -> String {
        let auth_count = endpoints.iter().filter(|e| e.requires_auth).count();
        let deprecated_count = endpoints.iter().filter(|e| e.deprecated).count();
        format!(
            "{} endpoints, {} dependency edges, {} requiring auth, {} deprecated",
            endpoints.len(),
            edges.len(),
            auth_count,
            deprecated_count
        )
    }

    pub async fn analyze(&self, ctx: &MessageContext, parsed: &ParseOutput) -> AnalysisOutput {
        let dependencies = Self::infer_dependencies(&parsed.endpoints);
        let execution_plan = Self::build_execution_plan(&parsed.endpoints, &dependencies);
        let mut risk_assessment = Self::assess_risk(&parsed.endpoints, &dependencies);

        let (mut test_strategy, rag_enriched) = match self.rag.search(&risk_assessment).await {
            Ok(rag_ctx) if !rag_ctx.is_empty() => (
                format!(
                    "exercise every dependency edge in phase order; context: {}",
                    rag_ctx.documents.join("; ")
                ),
                true,
            ),
            _ => (
                "exercise every dependency edge in phase order; no additional context available".to_string(),
                false,
            ),
        };

        // Intelligent enrichment: ask the model for a narrative risk/strategy
        // summary, streamed chunk-by-chunk; on any failure or unparseable
        // output, fall back to the deterministic assessment above, mirroring
        // `_build_dependency_graph`'s degrade-on-LLM-failure behaviour.
        let task_prompt = format!(
            "Analyze the testing risk for {} API endpoints with dependency assessment: \"{}\". \
             Respond with a JSON object with string fields \"risk_assessment\" and \"test_strategy\".",
            parsed.endpoints.len(),
            risk_assessment
        );
        match self.base.run_llm(ctx, "analyzer", task_prompt, true).await {
            Ok(text) => {
                if let Some(extracted) = BaseAgent::extract_json(&text) {
                    if let Some(risk) = extracted.get("risk_assessment").and_then(Value::as_str) {
                        risk_assessment = risk.to_string();
                    }
                    if let Some(strategy) = extracted.get("test_strategy").and_then(Value::as_str) {
                        test_strategy = strategy.to_string();
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "analyzer LLM enrichment failed, using deterministic assessment");
            }
        }

        AnalysisOutput {
            endpoints: parsed.endpoints.clone(),
            dependencies,
            execution_plan,
            risk_assessment,
            test_strategy,
            rag_enriched,
        }
    }
}

#[async_trait]
impl Agent for AnalyzerAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Analyzer
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        let TypedMessage::AnalysisInput { ctx, payload } = msg else {
            return Ok(());
        };
        let monitor = self.base.start_monitor();

        let output = self.analyze(&ctx, &payload).await;

        self.base
            .send_response(
                TopicType::AnalysisOutput,
                &ctx,
                TypedMessage::AnalysisOutput {
                    ctx: ctx.clone(),
                    payload: output.clone(),
                },
            )
            .await?;

        self.base
            .send_response(
                TopicType::TestCaseGenerationRequest,
                &ctx,
                TypedMessage::TestCaseGenerationInput {
                    ctx: ctx.propagate("analyzer"),
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
    use qa_core_utils::DocumentFormat;

    fn sample_endpoints() -> Vec<ApiEndpoint> {
        vec![
            ApiEndpoint::new("/widgets", "POST").with_requires_auth(true),
            ApiEndpoint::new("/widgets/{id}", "GET"),
            ApiEndpoint::new("/widgets/{id}", "DELETE"),
        ]
    }

    fn agent() -> AnalyzerAgent {
        AnalyzerAgent::new(Arc::new(qa_core_bus::MessageBus::new()), Box::new(MockChatModel::default()))
    }

    #[test]
    fn test_infers_sequence_dependency_from_create_to_read() {
        let endpoints = sample_endpoints();
        let edges = AnalyzerAgent::infer_dependencies(&endpoints);
        assert!(edges.iter().any(|e| e.from == 0 && e.to == 1 && e.kind == DependencyEdgeKind::Sequence));
        assert!(edges.iter().any(|e| e.from == 0 && e.to == 2 && e.kind == DependencyEdgeKind::Sequence));
    }

    #[test]
    fn test_execution_plan_orders_create_before_dependents() {
        let endpoints = sample_endpoints();
        let edges = AnalyzerAgent::infer_dependencies(&endpoints);
        let plan = AnalyzerAgent::build_execution_plan(&endpoints, &edges);
        assert!(plan[0].parallel_group.contains(&0));
        assert!(!plan[0].parallel_group.contains(&1));
    }

    #[test]
    fn test_empty_endpoints_yields_empty_plan() {
        let plan = AnalyzerAgent::build_execution_plan(&[], &[]);
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_degrades_without_rag() {
        let agent = agent();
        let mut parsed = ParseOutput::empty(DocumentFormat::OpenApi);
        parsed.endpoints = sample_endpoints();
        let output = agent.analyze(&MessageContext::new("test"), &parsed).await;
        assert!(!output.rag_enriched);
        assert_eq!(output.endpoints.len(), 3);
    }
}
