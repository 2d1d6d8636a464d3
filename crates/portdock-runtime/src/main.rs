//! portdock: dock for locally running dev servers.
//! CLI front end over the sync engine; the privileged scanning backend
//! is reached through its UDS JSON-RPC socket.

use clap::Parser;

mod cli;
mod client;
mod cmd_kill;
mod cmd_ls;
mod cmd_open;
mod cmd_watch;
mod display;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("PORTDOCK_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);
    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Ls(cli::LsOpts::default()));

    match command {
        cli::Command::Ls(opts) => cmd_ls::cmd_ls(&socket_path, &opts).await?,
        cli::Command::Watch(opts) => {
            cmd_watch::cmd_watch(&socket_path, opts.filter.as_deref()).await?;
        }
        cli::Command::Kill(opts) => cmd_kill::cmd_kill(&socket_path, opts.pid).await?,
        cli::Command::Open(opts) => cmd_open::cmd_open(&socket_path, opts.port).await?,
    }

    Ok(())
}
