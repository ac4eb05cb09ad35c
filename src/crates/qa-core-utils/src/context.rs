//! `MessageContext`: correlation metadata propagated unchanged through a pipeline.

use serde::{Deserialize, Serialize};

use crate::ids::new_id;

/// Correlation metadata attached to every published message. Created once by
/// the entry point and carried unchanged by every agent so that messages
/// emitted anywhere in a pipeline run remain correlated back to the session
/// that started it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub session_id: String,
    pub document_id: Option<String>,
    pub execution_id: Option<String>,
    pub sender: String,
}

impl MessageContext {
    /// Start a new correlation chain for a fresh session.
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            session_id: new_id(),
            document_id: None,
            execution_id: None,
            sender: sender.into(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    /// A copy of this context carried forward by the next agent in the
    /// pipeline, re-stamped with the new sender.
    pub fn propagate(&self, sender: impl Into<String>) -> Self {
        Self {
            session_id: self.session_id.clone(),
            document_id: self.document_id.clone(),
            execution_id: self.execution_id.clone(),
            sender: sender.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagate_keeps_session() {
        let ctx = MessageContext::new("entrypoint").with_document_id("doc-1");
        let next = ctx.propagate("doc_parser");
        assert_eq!(next.session_id, ctx.session_id);
        assert_eq!(next.document_id, ctx.document_id);
        assert_eq!(next.sender, "doc_parser");
    }
}
