//! UDS JSON-RPC client for the process directory backend.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use portdock_core::ServerRecord;
use portdock_sync::{DirectoryError, ProcessDirectory};

/// `ProcessDirectory` implementation speaking newline-delimited JSON-RPC
/// 2.0 over the backend's unix socket. One connection per call; the
/// backend answers with a single response line.
pub struct DirectoryClient {
    socket_path: String,
}

impl DirectoryClient {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, DirectoryError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            DirectoryError::Unreachable(format!(
                "cannot connect to backend at {}: {e}",
                self.socket_path
            ))
        })?;

        let (reader, mut writer) = stream.into_split();

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        let mut req = serde_json::to_string(&request)?;
        req.push('\n');
        writer.write_all(req.as_bytes()).await?;
        writer.shutdown().await?;

        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        reader.read_line(&mut line).await?;

        let response: serde_json::Value = serde_json::from_str(line.trim())?;

        if let Some(error) = response.get("error") {
            return Err(DirectoryError::Rpc(error.to_string()));
        }

        Ok(response
            .get("result")
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl ProcessDirectory for DirectoryClient {
    async fn get_servers(&self) -> Result<Vec<ServerRecord>, DirectoryError> {
        let result = self.rpc_call("get_servers", serde_json::json!({})).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn kill_process(&self, pid: u32) -> Result<bool, DirectoryError> {
        let result = self
            .rpc_call("kill_process", serde_json::json!({ "pid": pid }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn open_browser(&self, port: u16) -> Result<(), DirectoryError> {
        self.rpc_call("open_browser", serde_json::json!({ "port": port }))
            .await?;
        Ok(())
    }
}
