//! CLI definition using clap derive.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portdock", about = "dock for locally running dev servers")]
pub struct Cli {
    /// Backend UDS socket path (default: $XDG_RUNTIME_DIR/portdock/portdockd.sock)
    #[arg(long, short = 's', global = true)]
    pub socket_path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List running servers once, grouped by category
    Ls(LsOpts),
    /// Live view: poll the backend and reprint on changes
    Watch(WatchOpts),
    /// Terminate a process by pid
    Kill(KillOpts),
    /// Open a port in the default browser
    Open(OpenOpts),
}

#[derive(clap::Args, Default)]
pub struct LsOpts {
    /// Filter by project name, process name, or port
    #[arg(long, short = 'f')]
    pub filter: Option<String>,

    /// Expand the system section (folded by default)
    #[arg(long)]
    pub all: bool,

    /// Print raw records as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct WatchOpts {
    /// Filter by project name, process name, or port
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

#[derive(clap::Args)]
pub struct KillOpts {
    pub pid: u32,
}

#[derive(clap::Args)]
pub struct OpenOpts {
    pub port: u16,
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/portdock/portdockd.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/portdock-{user}/portdockd.sock")
}
