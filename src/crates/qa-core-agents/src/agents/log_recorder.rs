//! Log Recorder: buffers per-session log records and triggers threshold- or
//! severity-driven analysis.
//!
//! Grounded on `original_source/.../log_recorder_agent.py`'s
//! `_should_analyze_logs` (immediate on error/critical, otherwise every 50
//! records) and `_analyze_logs`' error-rate/grouping pass.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use qa_core_agent_runtime::{Agent, AgentResult};
use qa_core_bus::SharedBus;
use qa_core_llm::{ChatModel, ChatRequest};
use qa_core_utils::{AgentType, LogLevel, LogRecord, MessageContext, TopicType, TypedMessage};

use crate::base_agent::BaseAgent;

/// Threshold at which a session's buffer triggers analysis even without an
/// error-severity record (source: `_should_analyze_logs`'s `% 50 == 0`).
const ANALYSIS_BATCH_SIZE: usize = 50;

/// Mirrors `alert_rules["error_rate_threshold"]` in
/// `original_source/.../log_recorder_agent.py` (there expressed as a percent,
/// `5.0`; kept as a fraction here to match `LogAnalysis::error_rate`).
const ERROR_RATE_ALERT_THRESHOLD: f64 = 0.05;

/// The original's remaining rules (`response_time_threshold`,
/// `memory_usage_threshold`, `disk_usage_threshold`) have no counterpart
/// signal in this agent's `LogAnalysis` — only error rate and message
/// grouping are computed here, so only an error-rate rule and a
/// repeated-message burst rule are implemented. A burst of the same error
/// message this many times or more within one analysis window is its own
/// alert, independent of the overall error rate.
const REPEATED_ERROR_ALERT_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub struct LogAlert {
    pub rule: String,
    pub message: String,
    pub severity: LogLevel,
}

#[derive(Debug, Clone, Default)]
pub struct LogAnalysis {
    pub total: usize,
    pub error_rate: f64,
    pub top_error_messages: Vec<(String, usize)>,
    pub narrative: Option<String>,
    pub alerts: Vec<LogAlert>,
}

pub struct LogRecorderAgent {
    base: BaseAgent,
    sessions: Mutex<HashMap<String, Vec<LogRecord>>>,
}

impl LogRecorderAgent {
    pub fn new(bus: SharedBus, model_client: Box<dyn ChatModel>) -> Self {
        Self {
            base: BaseAgent::new(AgentType::LogRecorder, bus, model_client),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn should_analyze(buffer_len: usize, level: LogLevel) -> bool {
        level >= LogLevel::Error || (buffer_len > 0 && buffer_len % ANALYSIS_BATCH_SIZE == 0)
    }

    fn analyze(buffer: &[LogRecord]) -> LogAnalysis {
        let total = buffer.len();
        if total == 0 {
            return LogAnalysis::default();
        }
        let errors: Vec<&LogRecord> = buffer.iter().filter(|r| r.level >= LogLevel::Error).collect();
        let error_rate = errors.len() as f64 / total as f64;

        let mut grouped: HashMap<&str, usize> = HashMap::new();
        for record in &errors {
            *grouped.entry(record.message.as_str()).or_insert(0) += 1;
        }
        let mut top: Vec<(String, usize)> = grouped.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(5);

        LogAnalysis {
            total,
            error_rate,
            top_error_messages: top,
            narrative: None,
            alerts: Vec::new(),
        }
    }

    /// Evaluates the alert rule set against a completed analysis pass
    /// (`_generate_alerts`/`_send_alert` in the grounding source). Returns
    /// one alert per rule that fires; an empty session or a healthy error
    /// rate yields no alerts.
    fn check_alert_rules(analysis: &LogAnalysis) -> Vec<LogAlert> {
        let mut alerts = Vec::new();

        if analysis.total > 0 && analysis.error_rate >= ERROR_RATE_ALERT_THRESHOLD {
            alerts.push(LogAlert {
                rule: "error_rate_threshold".to_string(),
                message: format!(
                    "error rate {:.1}% over {} records exceeds the {:.0}% threshold",
                    analysis.error_rate * 100.0,
                    analysis.total,
                    ERROR_RATE_ALERT_THRESHOLD * 100.0
                ),
                severity: LogLevel::Critical,
            });
        }

        for (message, count) in &analysis.top_error_messages {
            if *count >= REPEATED_ERROR_ALERT_COUNT {
                alerts.push(LogAlert {
                    rule: "repeated_error_burst".to_string(),
                    message: format!("\"{message}\" repeated {count} times"),
                    severity: LogLevel::Error,
                });
            }
        }

        alerts
    }

    /// Best-effort narrative summary; an LLM failure leaves `narrative` unset
    /// rather than failing the handler — arithmetic analysis already stands
    /// on its own.
    async fn narrate(&self, analysis: &LogAnalysis) -> Option<String> {
        if analysis.total == 0 {
            return None;
        }
        let prompt = format!(
            "Summarize this session's log health in one sentence: {} records, {:.1}% error rate, top errors: {:?}",
            analysis.total,
            analysis.error_rate * 100.0,
            analysis.top_error_messages
        );
        let request = ChatRequest::new(vec![qa_core_llm::Message::human(prompt)]);
        match self.base.model_client.chat(request).await {
            Ok(response) => response.message.content.as_text().map(|s| s.to_string()),
            Err(err) => {
                tracing::debug!(%err, "log narrative generation failed, continuing without it");
                None
            }
        }
    }

    pub async fn record(&self, record: LogRecord) -> LogAnalysis {
        let (buffer_len, level) = {
            let mut sessions = self.sessions.lock();
            let buffer = sessions.entry(record.session_id.clone()).or_default();
            buffer.push(record.clone());
            (buffer.len(), record.level)
        };

        if !Self::should_analyze(buffer_len, level) {
            return LogAnalysis::default();
        }

        let mut analysis = {
            let sessions = self.sessions.lock();
            let buffer = sessions.get(&record.session_id).cloned().unwrap_or_default();
            Self::analyze(&buffer)
        };
        analysis.narrative = self.narrate(&analysis).await;
        analysis.alerts = Self::check_alert_rules(&analysis);
        analysis
    }

    /// Publishes each alert from a completed analysis as a final stream
    /// chunk carrying a structured result, so the stream collector forwards
    /// it to external consumers (`_send_alert` in the grounding source).
    /// Alerts deliberately do *not* go back out on the `LogRecord` topic:
    /// that's this agent's own canonical input topic, and re-publishing
    /// there would feed the alert straight back into `handle` as a new log
    /// record to analyze.
    async fn publish_alerts(&self, ctx: &MessageContext, session_id: &str, analysis: &LogAnalysis) {
        for alert in &analysis.alerts {
            let publish = self
                .base
                .send_response(
                    TopicType::StreamOutput,
                    ctx,
                    TypedMessage::StreamResponse {
                        ctx: ctx.clone(),
                        payload: qa_core_utils::StreamResponse {
                            source: "log_recorder".to_string(),
                            content: format!("alert[{}]: {}", alert.rule, alert.message),
                            is_final: true,
                            result: Some(serde_json::json!({
                                "session_id": session_id,
                                "rule": alert.rule,
                                "message": alert.message,
                                "severity": alert.severity,
                            })),
                        },
                    },
                )
                .await;
            if let Err(err) = publish {
                tracing::warn!(%err, rule = %alert.rule, "failed to publish log alert");
            }
        }
    }
}

#[async_trait]
impl Agent for LogRecorderAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::LogRecorder
    }

    async fn handle(&self, msg: TypedMessage) -> AgentResult {
        let TypedMessage::LogRecord { ctx, payload } = msg else {
            return Ok(());
        };
        let monitor = self.base.start_monitor();
        let session_id = payload.session_id.clone();
        let analysis = self.record(payload).await;
        self.publish_alerts(&ctx, &session_id, &analysis).await;
        self.base.end_monitor(monitor, true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core_llm::remote::mock::MockChatModel;
    use serde_json::Map;

    fn agent() -> LogRecorderAgent {
        LogRecorderAgent::new(Arc::new(qa_core_bus::MessageBus::new()), Box::new(MockChatModel::default()))
    }

    fn record(session_id: &str, level: LogLevel, message: &str) -> LogRecord {
        LogRecord {
            session_id: session_id.to_string(),
            source: "executor".to_string(),
            level,
            message: message.to_string(),
            metadata: Map::new(),
            operation: "run".to_string(),
            timestamp: qa_core_utils::now(),
        }
    }

    #[tokio::test]
    async fn test_info_log_below_threshold_does_not_analyze() {
        let agent = agent();
        let analysis = agent.record(record("s1", LogLevel::Info, "ok")).await;
        assert_eq!(analysis.total, 0);
    }

    #[tokio::test]
    async fn test_error_log_triggers_immediate_analysis() {
        let agent = agent();
        let analysis = agent.record(record("s1", LogLevel::Error, "boom")).await;
        assert_eq!(analysis.total, 1);
        assert_eq!(analysis.error_rate, 1.0);
    }

    #[tokio::test]
    async fn test_high_error_rate_fires_error_rate_alert() {
        let agent = agent();
        let analysis = agent.record(record("s1", LogLevel::Error, "boom")).await;
        assert!(analysis
            .alerts
            .iter()
            .any(|a| a.rule == "error_rate_threshold"));
    }

    #[tokio::test]
    async fn test_healthy_session_has_no_alerts() {
        let agent = agent();
        for _ in 0..49 {
            agent.record(record("s1", LogLevel::Info, "ok")).await;
        }
        let analysis = agent.record(record("s1", LogLevel::Info, "ok")).await;
        assert!(analysis.alerts.is_empty());
    }

    #[test]
    fn test_repeated_error_message_fires_burst_alert() {
        let buffer = vec![
            record("s1", LogLevel::Error, "timeout"),
            record("s1", LogLevel::Error, "timeout"),
            record("s1", LogLevel::Error, "timeout"),
        ];
        let mut analysis = LogRecorderAgent::analyze(&buffer);
        analysis.alerts = LogRecorderAgent::check_alert_rules(&analysis);
        assert!(analysis
            .alerts
            .iter()
            .any(|a| a.rule == "repeated_error_burst" && a.message.contains("timeout")));
    }

    #[tokio::test]
    async fn test_handle_publishes_alert_on_stream_output_not_log_record() {
        let bus = Arc::new(qa_core_bus::MessageBus::new());
        let mut stream_rx = bus.subscribe(TopicType::StreamOutput, AgentType::StreamCollector).unwrap();
        let agent = LogRecorderAgent::new(bus.clone(), Box::new(MockChatModel::default()));

        let msg = TypedMessage::LogRecord {
            ctx: qa_core_utils::MessageContext::new("executor"),
            payload: record("s1", LogLevel::Error, "boom"),
        };
        agent.handle(msg).await.unwrap();

        let published = stream_rx.try_recv().unwrap();
        let TypedMessage::StreamResponse { payload, .. } = published else {
            panic!("expected a StreamResponse alert");
        };
        assert!(payload.content.starts_with("alert["));
        assert!(payload.is_final);
    }

    #[tokio::test]
    async fn test_fiftieth_record_triggers_analysis_even_if_info() {
        let agent = agent();
        for _ in 0..49 {
            agent.record(record("s1", LogLevel::Info, "ok")).await;
        }
        let analysis = agent.record(record("s1", LogLevel::Info, "ok")).await;
        assert_eq!(analysis.total, 50);
    }

    #[test]
    fn test_groups_duplicate_error_messages() {
        let buffer = vec![
            record("s1", LogLevel::Error, "timeout"),
            record("s1", LogLevel::Error, "timeout"),
            record("s1", LogLevel::Error, "connection refused"),
        ];
        let analysis = LogRecorderAgent::analyze(&buffer);
        assert_eq!(analysis.top_error_messages[0], ("timeout".to_string(), 2));
    }
}
