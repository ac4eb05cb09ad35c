//! Doc Parser: normalises an API document (OpenAPI/Swagger/Postman/PDF) into
//! a `ParseOutput`, never failing hard on malformed input.
//!
//! Grounded on `original_source/.../api_doc_parser_agent.py`'s format
//! sniffing and low-confidence-on-failure behaviour.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use qa_core_agent_runtime::{Agent, AgentResult};
use qa_core_bus::SharedBus;
use qa_core_llm::ChatModel;
use qa_core_utils::{
    AgentType, ApiEndpoint, DocumentFormat, MessageContext, ParseOutput, TopicType, TypedMessage,
};

use crate::base_agent::BaseAgent;

pub struct DocParserAgent {
    base: BaseAgent,
}

impl DocParserAgent {
    pub fn new(bus: SharedBus, model_client: Box<dyn ChatModel>) -> Self {
        Self {
            base: BaseAgent::new(AgentType::DocParser, bus, model_client),
        }
    }

    /// Content-sniff the format when the caller passed `auto`/unknown.
    fn detect_format(hint: &str, content: &[u8]) -> DocumentFormat {
        match hint.to_ascii_lowercase().as_str() {
            "openapi" => return DocumentFormat::OpenApi,
            "swagger" => return DocumentFormat::Swagger,
            "postman" => return DocumentFormat::Postman,
            "pdf" => return DocumentFormat::Pdf,
            _ => {}
        }

        if content.starts_with(b"%PDF") {
            return DocumentFormat::Pdf;
        }

        let text = String::from_utf8_lossy(content);
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            if let Some(obj) = value.as_object() {
                if obj.contains_key("openapi") {
                    return DocumentFormat::OpenApi;
                }
                if obj.contains_key("swagger") {
                    return DocumentFormat::Swagger;
                }
                if obj.contains_key("info") && obj.contains_key("item") {
                    return DocumentFormat::Postman;
                }
            }
        }
        DocumentFormat::Unknown
    }

    fn parse_openapi_like(value: &Value) -> (Map<String, Value>, Vec<ApiEndpoint>, Vec<String>) {
        let mut warnings = Vec::new();
        let api_info = value
            .get("info")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut endpoints = Vec::new();
        if let Some(paths) = value.get("paths").and_then(Value::as_object) {
            for (path, methods) in paths {
                let Some(methods) = methods.as_object() else {
                    warnings.push(format!("path {path} has no operations, skipping"));
                    continue;
                };
                for (method, operation) in methods {
                    if !matches!(
                        method.to_ascii_lowercase().as_str(),
                        "get" | "post" | "put" | "patch" | "delete" | "head" | "options"
                    ) {
                        continue;
                    }
                    let mut endpoint = ApiEndpoint::new(path.clone(), method.to_ascii_uppercase());
                    if let Some(obj) = operation.as_object() {
                        endpoint.parameters = obj
                            .get("parameters")
                            .and_then(Value::as_array)
                            .cloned()
                            .unwrap_or_default();
                        endpoint.responses = obj
                            .get("responses")
                            .and_then(Value::as_object)
                            .cloned()
                            .unwrap_or_default();
                        endpoint.deprecated = obj
                            .get("deprecated")
                            .and_then(Value::as_bool)
                            .unwrap_or(false);
                        endpoint.tags = obj
                            .get("tags")
                            .and_then(Value::as_array)
                            .map(|tags| {
                                tags.iter().filter_map(|t| t.as_str().map(String::from)).collect()
                            })
                            .unwrap_or_default();
                        endpoint.requires_auth = obj.contains_key("security");
                        for (key, val) in obj {
                            if key.starts_with("x-") {
                                endpoint.extended_info.insert(key.clone(), val.clone());
                            }
                        }
                    }
                    endpoints.push(endpoint);
                }
            }
        } else {
            warnings.push("document has no `paths` object".to_string());
        }

        (api_info, endpoints, warnings)
    }

    fn parse_postman(value: &Value) -> (Map<String, Value>, Vec<ApiEndpoint>, Vec<String>) {
        let mut warnings = Vec::new();
        let api_info = value
            .get("info")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let mut endpoints = Vec::new();

        fn walk(items: &[Value], endpoints: &mut Vec<ApiEndpoint>, warnings: &mut Vec<String>) {
            for item in items {
                if let Some(nested) = item.get("item").and_then(Value::as_array) {
                    walk(nested, endpoints, warnings);
                    continue;
                }
                let Some(request) = item.get("request") else {
                    warnings.push("postman item with no request, skipping".to_string());
                    continue;
                };
                let method = request
                    .get("method")
                    .and_then(Value::as_str)
                    .unwrap_or("GET")
                    .to_string();
                let path = request
                    .get("url")
                    .and_then(|u| u.get("raw").or(Some(u)))
                    .and_then(Value::as_str)
                    .unwrap_or("/")
                    .to_string();
                endpoints.push(ApiEndpoint::new(path, method));
            }
        }

        if let Some(items) = value.get("item").and_then(Value::as_array) {
            walk(items, &mut endpoints, &mut warnings);
        } else {
            warnings.push("postman collection has no `item` array".to_string());
        }

        (api_info, endpoints, warnings)
    }

    pub fn parse(&self, content: &[u8], format_hint: &str) -> ParseOutput {
        let format = Self::detect_format(format_hint, content);

        if format == DocumentFormat::Pdf {
            let mut out = ParseOutput::low_confidence(format, "PDF extraction is not implemented");
            out.confidence_score = 0.2;
            return out;
        }

        let text = match std::str::from_utf8(content) {
            Ok(t) => t,
            Err(_) => return ParseOutput::low_confidence(DocumentFormat::Unknown, "content is not valid UTF-8"),
        };

        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => return ParseOutput::low_confidence(format, format!("invalid JSON document: {e}")),
        };

        let (api_info, endpoints, mut warnings) = match format {
            DocumentFormat::Postman => Self::parse_postman(&value),
            _ => Self::parse_openapi_like(&value),
        };

        let confidence_score = if endpoints.is_empty() { 0.3 } else { 0.9 };
        if endpoints.is_empty() {
            warnings.push("no endpoints were recovered from the document".to_string());
        }

        ParseOutput {
            api_info,
            endpoints,
            format,
            confidence_score,
            errors: Vec::new(),
            warnings,
        }
    }

    /// Stream a one-line narration of the parsed document through the model
    /// client (spec.md §4.4). Mirrors `_intelligent_parse_document`'s LLM
    /// pass in `original_source/.../api_doc_parser_agent.py`, but only as
    /// narration — the deterministic `parse` result above remains
    /// authoritative, since nothing in SPEC_FULL asks the model to replace
    /// the structural parse, only to narrate it to stream subscribers.
    /// Failure here is non-fatal: it's logged and otherwise ignored.
    async fn narrate(&self, ctx: &MessageContext, output: &ParseOutput) {
        let task_prompt = format!(
            "Summarize in one sentence: a {:?} document with {} endpoints was parsed at confidence {:.2}.",
            output.format,
            output.endpoints.len(),
            output.confidence_score
        );
        if let Err(err) = self.base.run_llm(ctx, "doc_parser", task_prompt, true).await {
            tracing::debug!(error = %err, "doc parser narration failed, continuing without it");
        }
    }
}

#[async_trait]
impl Agent for DocParserAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::DocParser
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        let TypedMessage::ParseInput { ctx, payload } = msg else {
            return Ok(());
        };
        let monitor = self.base.start_monitor();

        let output = self.parse(&payload.content, &payload.format_hint);
        self.narrate(&ctx, &output).await;

        self.base
            .send_response(
                TopicType::ParseOutput,
                &ctx,
                TypedMessage::ParseOutput {
                    ctx: ctx.clone(),
                    payload: output.clone(),
                },
            )
            .await?;

        self.base
            .send_response(
                TopicType::PersistenceRequest,
                &ctx,
                TypedMessage::ParseOutput {
                    ctx: ctx.propagate("doc_parser"),
                    payload: output.clone(),
                },
            )
            .await?;

        self.base
            .send_response(
                TopicType::AnalysisRequest,
                &ctx,
                TypedMessage::AnalysisInput {
                    ctx: ctx.propagate("doc_parser"),
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
    use qa_core_bus::MessageBus;
    use qa_core_llm::remote::mock::MockChatModel;
    use qa_core_utils::MessageContext;

    fn agent() -> DocParserAgent {
        DocParserAgent::new(Arc::new(MessageBus::new()), Box::new(MockChatModel::default()))
    }

    #[test]
    fn test_detects_openapi_by_content() {
        let doc = br#"{"openapi": "3.0.0", "paths": {}}"#;
        assert_eq!(DocParserAgent::detect_format("auto", doc), DocumentFormat::OpenApi);
    }

    #[test]
    fn test_detects_postman_by_content() {
        let doc = br#"{"info": {"name": "x"}, "item": []}"#;
        assert_eq!(DocParserAgent::detect_format("auto", doc), DocumentFormat::Postman);
    }

    #[test]
    fn test_malformed_input_yields_low_confidence_not_panic() {
        let agent = agent();
        let out = agent.parse(b"not json at all", "openapi");
        assert!(out.confidence_score < 0.5);
        assert!(!out.errors.is_empty());
    }

    #[test]
    fn test_parses_one_get_endpoint() {
        let agent = agent();
        let doc = br#"{
            "openapi": "3.0.0",
            "info": {"title": "t"},
            "paths": {"/health": {"get": {"responses": {"200": {}}}}}
        }"#;
        let out = agent.parse(doc, "auto");
        assert_eq!(out.endpoints.len(), 1);
        assert_eq!(out.endpoints[0].method, "GET");
        assert!(out.confidence_score > 0.5);
    }

    #[tokio::test]
    async fn test_handle_publishes_to_three_topics() {
        let bus = Arc::new(MessageBus::new());
        let mut persistence_rx = bus.subscribe(TopicType::PersistenceRequest, AgentType::Persistence).unwrap();
        let mut analysis_rx = bus.subscribe(TopicType::AnalysisRequest, AgentType::Analyzer).unwrap();
        let mut output_rx = bus.subscribe(TopicType::ParseOutput, AgentType::StreamCollector).unwrap();

        let agent = DocParserAgent::new(bus, Box::new(MockChatModel::default()));
        let ctx = MessageContext::new("test");
        let msg = TypedMessage::ParseInput {
            ctx,
            payload: qa_core_utils::ParseInput {
                content: br#"{"openapi":"3.0.0","paths":{}}"#.to_vec(),
                format_hint: "auto".to_string(),
            },
        };
        agent.handle(msg).await.unwrap();

        assert!(persistence_rx.try_recv().is_ok());
        assert!(analysis_rx.try_recv().is_ok());
        assert!(output_rx.try_recv().is_ok());
    }
}
