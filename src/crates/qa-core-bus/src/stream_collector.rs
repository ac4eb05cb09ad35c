//! `StreamCollector`: the single closure-agent subscribed to the
//! stream-output topic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use qa_core_utils::{StreamResponse, TopicType, TypedMessage};

use crate::bus::MessageBus;

/// An external consumer of collected stream chunks, typically forwarding to
/// a WebSocket.
#[async_trait]
pub trait StreamConsumer: Send + Sync {
    async fn consume(&self, response: StreamResponse);
}

/// Default flush cadence (spec.md §4.5).
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(300);

struct SourceBuffer {
    content: String,
    last_flush: Instant,
}

/// Buffers per-source partial chunks behind a single `tokio::sync::Mutex`,
/// held only across the synchronous buffer mutation and never across the
/// consumer callback's await (spec.md §5 no-lock-across-suspension rule).
pub struct StreamCollector<C: StreamConsumer> {
    buffers: Mutex<HashMap<String, SourceBuffer>>,
    flush_interval: Duration,
    consumer: C,
}

impl<C: StreamConsumer> StreamCollector<C> {
    pub fn new(consumer: C) -> Self {
        Self::with_flush_interval(consumer, DEFAULT_FLUSH_INTERVAL)
    }

    pub fn with_flush_interval(consumer: C, flush_interval: Duration) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            flush_interval,
            consumer,
        }
    }

    /// Handle one chunk: buffer it, flushing when due or immediately when
    /// the chunk is final. Never reorders a single source's chunks (I3) since
    /// buffering/flushing for one source always happens under the same lock
    /// in the order `handle` is called for that source.
    pub async fn handle(&self, response: StreamResponse) {
        if response.is_final {
            let pending = {
                let mut buffers = self.buffers.lock().await;
                buffers.remove(&response.source).map(|b| b.content)
            };
            let mut final_response = response;
            if let Some(pending) = pending.filter(|p| !p.is_empty()) {
                final_response.content = format!("{pending}{}", final_response.content);
            }
            self.consumer.consume(final_response).await;
            return;
        }

        let due = {
            let mut buffers = self.buffers.lock().await;
            let buffer = buffers
                .entry(response.source.clone())
                .or_insert_with(|| SourceBuffer {
                    content: String::new(),
                    last_flush: Instant::now(),
                });
            buffer.content.push_str(&response.content);
            if buffer.last_flush.elapsed() >= self.flush_interval {
                let content = std::mem::take(&mut buffer.content);
                buffer.last_flush = Instant::now();
                Some(content)
            } else {
                None
            }
        };

        if let Some(content) = due.filter(|c| !c.is_empty()) {
            self.consumer
                .consume(StreamResponse::chunk(response.source, content))
                .await;
        }
    }

    /// Flush every non-empty buffer. A second call with nothing newly
    /// buffered in between emits zero messages (spec.md §8 P3).
    pub async fn flush_all(&self) {
        let due: Vec<(String, String)> = {
            let mut buffers = self.buffers.lock().await;
            buffers
                .iter_mut()
                .filter(|(_, b)| !b.content.is_empty())
                .map(|(source, buffer)| {
                    let content = std::mem::take(&mut buffer.content);
                    buffer.last_flush = Instant::now();
                    (source.clone(), content)
                })
                .collect()
        };

        for (source, content) in due {
            self.consumer.consume(StreamResponse::chunk(source, content)).await;
        }
    }

    /// Subscribe to the bus's stream-output topic and drain it until the
    /// channel closes (bus shutdown or unsubscribe).
    pub async fn run(&self, bus: &MessageBus, agent_type: qa_core_utils::AgentType) {
        let Some(mut rx) = bus.subscribe(TopicType::StreamOutput, agent_type) else {
            tracing::warn!("stream collector already subscribed, run() is a no-op");
            return;
        };
        while let Some(msg) = rx.recv().await {
            if let TypedMessage::StreamResponse { payload, .. } = msg {
                self.handle(payload).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PLMutex;
    use std::sync::Arc;

    struct RecordingConsumer {
        received: Arc<PLMutex<Vec<StreamResponse>>>,
    }

    #[async_trait]
    impl StreamConsumer for RecordingConsumer {
        async fn consume(&self, response: StreamResponse) {
            self.received.lock().push(response);
        }
    }

    #[tokio::test]
    async fn test_non_final_chunk_buffers_until_flush_interval() {
        let received = Arc::new(PLMutex::new(Vec::new()));
        let collector = StreamCollector::with_flush_interval(
            RecordingConsumer { received: received.clone() },
            Duration::from_secs(3600),
        );
        collector.handle(StreamResponse::chunk("agent-a", "hello ")).await;
        collector.handle(StreamResponse::chunk("agent-a", "world")).await;
        assert!(received.lock().is_empty());

        collector.flush_all().await;
        let got = received.lock();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].content, "hello world");
    }

    #[tokio::test]
    async fn test_double_flush_all_emits_nothing_second_time() {
        let received = Arc::new(PLMutex::new(Vec::new()));
        let collector = StreamCollector::with_flush_interval(
            RecordingConsumer { received: received.clone() },
            Duration::from_secs(3600),
        );
        collector.handle(StreamResponse::chunk("a", "x")).await;
        collector.flush_all().await;
        assert_eq!(received.lock().len(), 1);
        collector.flush_all().await;
        assert_eq!(received.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_final_chunk_flushes_pending_then_forwards() {
        let received = Arc::new(PLMutex::new(Vec::new()));
        let collector = StreamCollector::with_flush_interval(
            RecordingConsumer { received: received.clone() },
            Duration::from_secs(3600),
        );
        collector.handle(StreamResponse::chunk("a", "partial-")).await;
        collector.handle(StreamResponse::final_text("a", "done")).await;

        let got = received.lock();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].content, "partial-done");
        assert!(got[0].is_final);
    }

    #[tokio::test]
    async fn test_interleaved_sources_do_not_mix() {
        let received = Arc::new(PLMutex::new(Vec::new()));
        let collector = StreamCollector::with_flush_interval(
            RecordingConsumer { received: received.clone() },
            Duration::from_secs(3600),
        );
        collector.handle(StreamResponse::chunk("a", "1")).await;
        collector.handle(StreamResponse::chunk("b", "x")).await;
        collector.handle(StreamResponse::chunk("a", "2")).await;
        collector.flush_all().await;

        let got = received.lock();
        let a_content: String = got.iter().find(|r| r.source == "a").unwrap().content.clone();
        assert_eq!(a_content, "12");
    }
}
