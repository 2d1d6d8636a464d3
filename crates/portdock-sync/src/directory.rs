//! The remote-invocation boundary to the privileged backend.

use async_trait::async_trait;
use thiserror::Error;

use portdock_core::ServerRecord;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Rpc(String),
}

/// The three operations the privileged backend exposes. Everything the
/// sync layer knows about the outside world goes through this trait, so
/// tests substitute scripted fakes.
#[async_trait]
pub trait ProcessDirectory: Send + Sync {
    /// Enumerate listening processes. Ordering is the backend's contract
    /// and is preserved downstream.
    async fn get_servers(&self) -> Result<Vec<ServerRecord>, DirectoryError>;

    /// Ask the backend to terminate a process. `Ok(true)` means the
    /// process was killed, `Ok(false)` means the backend declined.
    async fn kill_process(&self, pid: u32) -> Result<bool, DirectoryError>;

    /// Open `http://localhost:{port}` in the user's browser. Best-effort.
    async fn open_browser(&self, port: u16) -> Result<(), DirectoryError>;
}
