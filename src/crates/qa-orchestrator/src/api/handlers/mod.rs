//! API request handlers
//!
//! Provides handler functions for all API endpoints organized by resource.

pub mod entrypoints;
pub mod health;
pub mod system;

pub use entrypoints::{submit_execution, submit_parse, submit_ui_analysis};
pub use health::{health, health_detailed};
pub use system::{status, system_info, system_metrics};
