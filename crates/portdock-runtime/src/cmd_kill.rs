//! `portdock kill` — terminate a process and report the post-kill scan.

use std::sync::Arc;
use std::time::Duration;

use portdock_sync::{PollPolicy, SyncEngine};

use crate::client::DirectoryClient;

pub async fn cmd_kill(socket_path: &str, pid: u32) -> anyhow::Result<()> {
    let directory = Arc::new(DirectoryClient::new(socket_path));
    let engine = SyncEngine::new(directory, PollPolicy::default());

    let killed = engine.terminate(pid).await?;
    if !killed {
        anyhow::bail!("backend declined to terminate pid {pid}");
    }

    // Wait out the settle refresh so the printed count reflects the kill.
    let mut rx = engine.subscribe();
    let deadline = engine.policy().settle_delay + Duration::from_secs(2);
    match tokio::time::timeout(deadline, rx.changed()).await {
        Ok(Ok(())) => {
            let remaining = rx.borrow().snapshot.len();
            println!("terminated pid {pid}; {remaining} servers still listening");
        }
        _ => {
            tracing::debug!(pid, "settle refresh not observed before deadline");
            println!("terminated pid {pid}");
        }
    }

    engine.shutdown();
    Ok(())
}
