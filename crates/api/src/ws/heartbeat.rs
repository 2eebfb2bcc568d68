use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Spawn a background task that pings all connected WebSocket clients on a
/// fixed interval and prunes connections whose channels have died.
///
/// The interval comes from server configuration (`WS_HEARTBEAT_SECS`). A
/// dead connection normally removes itself when its receive loop exits;
/// the heartbeat catches the ones that never do, so a stale entry can
/// survive at most one interval. The returned `JoinHandle` is aborted
/// during shutdown.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;
            let pruned = ws_manager.ping_all().await;
            let remaining = ws_manager.connection_count().await;
            if pruned > 0 {
                tracing::info!(pruned, remaining, "WebSocket heartbeat pruned dead connections");
            } else {
                tracing::debug!(remaining, "WebSocket heartbeat ping");
            }
        }
    })
}
