//! WebSocket API support
//!
//! Real-time event streaming for connected clients, fed by the stream
//! collector's output.

pub mod error;
pub mod handler;

pub use error::{WsError, WsResult};
pub use handler::{ws_handler, BroadcastConsumer, BroadcastState, WsEvent};
