//! Bus-specific error type; converts into [`qa_core_utils::CoreError`] at
//! call sites that need the shared policy taxonomy.

use qa_core_utils::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    /// The bus is shutting down; publish fails terminally rather than
    /// silently dropping the message.
    #[error("message bus is shutting down")]
    ShuttingDown,
}

impl From<BusError> for CoreError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::ShuttingDown => CoreError::fatal(err.to_string()),
        }
    }
}
