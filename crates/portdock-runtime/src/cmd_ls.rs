//! `portdock ls` — one fetch cycle, grouped output.

use std::sync::Arc;

use chrono::Utc;

use portdock_core::{Category, ViewState, project};
use portdock_sync::{PollPolicy, SyncEngine};

use crate::cli::LsOpts;
use crate::client::DirectoryClient;
use crate::display::{format_groups, format_status};

pub async fn cmd_ls(socket_path: &str, opts: &LsOpts) -> anyhow::Result<()> {
    let directory = Arc::new(DirectoryClient::new(socket_path));
    // One-shot command: a failure should surface immediately, not retry.
    let policy = PollPolicy {
        max_retries: 1,
        ..PollPolicy::default()
    };
    let engine = SyncEngine::new(directory, policy);

    engine.refresh().await;
    let state = engine.state();
    if let Some(err) = &state.last_error {
        anyhow::bail!("{err}");
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&*state.snapshot)?);
        return Ok(());
    }

    let mut view = ViewState::new();
    if let Some(filter) = &opts.filter {
        view.set_filter(filter.clone());
    }
    if opts.all {
        view.toggle(Category::System);
    }

    let groups = project(&state.snapshot, &view);
    if groups.is_empty() {
        if opts.filter.is_some() {
            println!("no matching servers");
        } else {
            println!("no servers running");
        }
    } else {
        println!("{}", format_groups(&groups));
    }
    println!("{}", format_status(&state, Utc::now()));

    Ok(())
}
