//! Topic-routed pub/sub message bus and stream collector.
//!
//! The two L1 components from the orchestration core's layering: the
//! [`MessageBus`] delivers typed messages between agents, and the
//! [`StreamCollector`] is the single closure-agent that buffers and forwards
//! partial LLM output to an external consumer.

pub mod bus;
pub mod error;
pub mod stream_collector;

pub use bus::{MessageBus, SharedBus, DEFAULT_MAILBOX_CAPACITY};
pub use error::BusError;
pub use stream_collector::{StreamCollector, StreamConsumer, DEFAULT_FLUSH_INTERVAL};
