//! Applies a computed [`WindowBounds`] to a live browser window over a raw
//! Chrome DevTools Protocol websocket connection, independent of any
//! automation-library client.
//!
//! Grounded on `_adspower_apply_bounds_via_cdp_ws` in
//! `original_source/.../playwright_script_executor_agent.py`: connect to the
//! browser's CDP endpoint directly, pick (or create) a page target, resolve
//! its `windowId`, force the window into `normal` state before resizing (CDP
//! rejects bounds changes on a minimized/maximized window), apply the
//! bounds, then attach to the target and push a matching
//! `Emulation.setDeviceMetricsOverride` so the page's viewport tracks the
//! new window size rather than staying stuck at its previous layout.

use std::collections::HashMap;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use qa_core_utils::WindowBounds;

use crate::error::ExecutorError;

/// Windows scales CDP window-bounds values by the system DPI; this port has
/// no non-Python way to read that scale (`ctypes.windll.user32.GetDpiForSystem`
/// has no portable Rust equivalent) and this controller only ever targets
/// Linux automation hosts, so the DPI step from the original is a no-op
/// identity scale here rather than a faked reading.
fn to_dip(value: i32) -> i32 {
    value.max(1)
}

struct CdpClient {
    socket: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    next_id: u64,
}

impl CdpClient {
    async fn connect(ws_endpoint: &str) -> Result<Self, ExecutorError> {
        let (socket, _) = tokio_tungstenite::connect_async(ws_endpoint)
            .await
            .map_err(|e| ExecutorError::SandboxController(format!("CDP connect failed: {e}")))?;
        Ok(Self { socket, next_id: 0 })
    }

    async fn send(&mut self, method: &str, params: Option<Value>) -> Result<Value, ExecutorError> {
        self.send_in_session(method, params, None).await
    }

    async fn send_in_session(
        &mut self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, ExecutorError> {
        self.next_id += 1;
        let id = self.next_id;

        let mut payload = HashMap::new();
        payload.insert("id", json!(id));
        payload.insert("method", json!(method));
        if let Some(params) = params {
            payload.insert("params", params);
        }
        if let Some(session_id) = session_id {
            payload.insert("sessionId", json!(session_id));
        }

        let text = serde_json::to_string(&payload)
            .map_err(|e| ExecutorError::SandboxController(format!("CDP encode failed: {e}")))?;
        self.socket
            .send(Message::Text(text))
            .await
            .map_err(|e| ExecutorError::SandboxController(format!("CDP send failed: {e}")))?;

        loop {
            let msg = tokio::time::timeout(std::time::Duration::from_secs(3), self.socket.next())
                .await
                .map_err(|_| ExecutorError::SandboxController("CDP response timed out".to_string()))?
                .ok_or_else(|| ExecutorError::SandboxController("CDP socket closed".to_string()))?
                .map_err(|e| ExecutorError::SandboxController(format!("CDP read failed: {e}")))?;

            let Message::Text(text) = msg else { continue };
            let data: Value = serde_json::from_str(&text)
                .map_err(|e| ExecutorError::SandboxController(format!("CDP decode failed: {e}")))?;
            if data.get("id").and_then(Value::as_u64) == Some(id) {
                return Ok(data.get("result").cloned().unwrap_or(Value::Null));
            }
        }
    }
}

/// Connects to `ws_endpoint`, resolves a page target's window, and applies
/// `bounds` to it, then syncs the page's device-metrics viewport to match.
/// Best-effort: any protocol failure is surfaced as an `Err` for the caller
/// to log and continue past, never to abort the execution that asked for it.
pub async fn apply_window_bounds(
    ws_endpoint: &str,
    bounds: WindowBounds,
) -> Result<(), ExecutorError> {
    let mut client = CdpClient::connect(ws_endpoint).await?;

    let targets = client.send("Target.getTargets", None).await?;
    let mut target_id = targets
        .get("targetInfos")
        .and_then(Value::as_array)
        .and_then(|infos| {
            infos
                .iter()
                .find(|t| t.get("type").and_then(Value::as_str) == Some("page"))
        })
        .and_then(|t| t.get("targetId"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if target_id.is_none() {
        let created = client
            .send("Target.createTarget", Some(json!({ "url": "about:blank" })))
            .await?;
        target_id = created
            .get("targetId")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    let target_id = target_id
        .ok_or_else(|| ExecutorError::SandboxController("no page target available".to_string()))?;

    let info = client
        .send("Browser.getWindowForTarget", Some(json!({ "targetId": target_id })))
        .await?;
    let window_id = info
        .get("windowId")
        .and_then(Value::as_u64)
        .ok_or_else(|| ExecutorError::SandboxController("no windowId from target".to_string()))?;

    // Best-effort: a window already in normal state rejects this no-op fine,
    // but a minimized/maximized one must leave that state before its bounds
    // can be changed, so failures here are swallowed rather than propagated.
    let _ = client
        .send(
            "Browser.setWindowBounds",
            Some(json!({ "windowId": window_id, "bounds": { "windowState": "minimized" } })),
        )
        .await;
    let _ = client
        .send(
            "Browser.setWindowBounds",
            Some(json!({ "windowId": window_id, "bounds": { "windowState": "normal" } })),
        )
        .await;

    let dip = WindowBounds {
        left: to_dip(bounds.left),
        top: to_dip(bounds.top),
        width: to_dip(bounds.width),
        height: to_dip(bounds.height),
    };

    client
        .send(
            "Browser.setWindowBounds",
            Some(json!({
                "windowId": window_id,
                "bounds": {
                    "left": dip.left,
                    "top": dip.top,
                    "width": dip.width,
                    "height": dip.height,
                    "windowState": "normal",
                },
            })),
        )
        .await?;

    let attached = client
        .send("Target.attachToTarget", Some(json!({ "targetId": target_id, "flatten": true })))
        .await?;
    if let Some(session_id) = attached.get("sessionId").and_then(Value::as_str) {
        client
            .send_in_session(
                "Emulation.setDeviceMetricsOverride",
                Some(json!({
                    "width": dip.width,
                    "height": dip.height,
                    "deviceScaleFactor": 1,
                    "mobile": false,
                })),
                Some(session_id),
            )
            .await?;
    }

    Ok(())
}
