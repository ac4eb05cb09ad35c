//! `BrowserProfile` and `ConcurrencySlot`: UI-pipeline-only entities.

use serde::{Deserialize, Serialize};
use tokio::sync::OwnedSemaphorePermit;

use crate::ids::new_id;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WindowBounds {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A fingerprint profile isolating one UI execution: storage, canvas/webgl
/// identity, user-agent, timezone, and an optional proxy.
///
/// Lifecycle: created per ExecutionRequest by the Sandbox Manager, destroyed
/// on teardown (unconditionally when `delete_on_exit=true`). Invariant: no
/// two live profiles share a grid tile simultaneously when tiling is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserProfile {
    pub profile_id: String,
    pub group_id: String,
    pub proxy_config: Option<ProxyConfig>,
    pub fingerprint_config: serde_json::Value,
    pub ws_endpoint: String,
    pub window_bounds: WindowBounds,
}

impl BrowserProfile {
    pub fn new(group_id: impl Into<String>, ws_endpoint: impl Into<String>) -> Self {
        Self {
            profile_id: new_id(),
            group_id: group_id.into(),
            proxy_config: None,
            fingerprint_config: serde_json::json!({}),
            ws_endpoint: ws_endpoint.into(),
            window_bounds: WindowBounds::default(),
        }
    }

    pub fn with_window_bounds(mut self, bounds: WindowBounds) -> Self {
        self.window_bounds = bounds;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy_config = Some(proxy);
        self
    }
}

/// An abstract token held by an in-flight Executor while the Sandbox Manager
/// is in use. Wraps an [`OwnedSemaphorePermit`] so the I1 invariant (every
/// acquired slot is released on every exit path) falls out of `Drop` rather
/// than needing a manual release call at every return site.
pub struct ConcurrencySlot {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencySlot {
    pub fn new(permit: OwnedSemaphorePermit) -> Self {
        Self { _permit: permit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    #[tokio::test]
    async fn test_slot_releases_permit_on_drop() {
        let sem = Arc::new(Semaphore::new(1));
        assert_eq!(sem.available_permits(), 1);
        {
            let permit = sem.clone().acquire_owned().await.unwrap();
            let _slot = ConcurrencySlot::new(permit);
            assert_eq!(sem.available_permits(), 0);
        }
        assert_eq!(sem.available_permits(), 1);
    }
}
