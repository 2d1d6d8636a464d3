//! `portdock watch` — live view driven by the poll scheduler.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use portdock_core::{ServerRecord, ViewState, project};
use portdock_sync::{PollPolicy, PollScheduler, SyncEngine, SyncState};

use crate::client::DirectoryClient;
use crate::display::{format_groups, format_status};

pub async fn cmd_watch(socket_path: &str, filter: Option<&str>) -> anyhow::Result<()> {
    let directory = Arc::new(DirectoryClient::new(socket_path));
    let engine = SyncEngine::new(directory, PollPolicy::default());

    let mut view = ViewState::new();
    if let Some(filter) = filter {
        view.set_filter(filter);
    }

    // The terminal has no hide/show signal, so the surface counts as
    // visible until teardown. A windowed host would drive this channel
    // from its visibility events.
    let (_visibility, vis_rx) = watch::channel(false);
    let cancel = CancellationToken::new();
    let scheduler = PollScheduler::with_cancel(engine.clone(), vis_rx, cancel.clone());
    let poll_handle = tokio::spawn(scheduler.run());

    println!("scanning ports…");

    let mut rx = engine.subscribe();
    let mut last_rendered: Option<(Arc<[ServerRecord]>, bool)> = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow().clone();
                render(&state, &view, &mut last_rendered);
            }
        }
    }

    cancel.cancel();
    engine.shutdown();
    let _ = poll_handle.await;
    Ok(())
}

/// Reprint only when the snapshot identity or the error banner changed;
/// notification-only updates (`last_update` ticking on an unchanged
/// list) are skipped.
fn render(state: &SyncState, view: &ViewState, last: &mut Option<(Arc<[ServerRecord]>, bool)>) {
    if state.is_loading {
        // Keep the scanning banner until the first cycle resolves.
        return;
    }

    let has_error = state.last_error.is_some();
    if let Some((snapshot, had_error)) = last {
        if Arc::ptr_eq(snapshot, &state.snapshot) && *had_error == has_error {
            return;
        }
    }

    println!();
    let groups = project(&state.snapshot, view);
    if groups.is_empty() {
        println!("no servers running");
    } else {
        println!("{}", format_groups(&groups));
    }
    println!("{}", format_status(state, Utc::now()));

    *last = Some((Arc::clone(&state.snapshot), has_error));
}
