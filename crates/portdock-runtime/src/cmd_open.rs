//! `portdock open` — open a port in the default browser.

use std::sync::Arc;

use portdock_sync::{PollPolicy, SyncEngine};

use crate::client::DirectoryClient;

pub async fn cmd_open(socket_path: &str, port: u16) -> anyhow::Result<()> {
    let directory = Arc::new(DirectoryClient::new(socket_path));
    let engine = SyncEngine::new(directory, PollPolicy::default());
    // Best-effort: a failure is logged by the engine, never fatal.
    engine.open_externally(port).await;
    Ok(())
}
