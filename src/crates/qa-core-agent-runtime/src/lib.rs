//! Agent lifecycle runtime: the `Agent` trait, the `Runtime` that dispatches
//! messages to registered agents, and the `Factory` that builds them.

pub mod agent_trait;
pub mod factory;
pub mod runtime;

pub use agent_trait::{Agent, AgentResult};
pub use factory::Factory;
pub use runtime::{AgentHealth, AgentHealthSnapshot, HealthStatus, Runtime};
