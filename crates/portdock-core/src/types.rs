use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

// ─── Category ─────────────────────────────────────────────────────

/// Classification assigned to a listening process by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dev,
    App,
    System,
}

impl Category {
    /// Fixed display order: dev servers first, then applications, then
    /// system processes.
    pub const ALL: [Self; 3] = [Self::Dev, Self::App, Self::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::App => "app",
            Self::System => "system",
        }
    }

    /// Section heading shown above this category's group.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dev => "Dev Servers",
            Self::App => "Applications",
            Self::System => "System",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "app" => Ok(Self::App),
            "system" => Ok(Self::System),
            _ => Err(TypeError::UnknownCategory(s.to_string())),
        }
    }
}

// ─── ServerRecord ─────────────────────────────────────────────────

/// One listening process as reported by the backend.
///
/// Identity within a snapshot is `(pid, port)`: a process listening on
/// several ports produces one record per port. Field names are the
/// backend's wire format; do not rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub pid: u32,
    pub port: u16,
    pub project_name: String,
    /// Detected framework. Empty when unknown or not applicable.
    pub framework: String,
    pub uptime_seconds: u64,
    pub process_name: String,
    pub category: Category,
    /// Human description of the process. Empty means the backend did not
    /// recognize it.
    pub description: String,
}

impl ServerRecord {
    /// Whether the backend recognized this process.
    pub fn is_recognized(&self) -> bool {
        !self.description.is_empty()
    }
}
