//! Sync engine: one fetch cycle at a time, change-gated snapshot swaps,
//! retry accounting, and the termination / open-browser workflows.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use portdock_core::{ServerRecord, should_replace};

use crate::directory::{DirectoryError, ProcessDirectory};

// ─── Policy ───────────────────────────────────────────────────────

/// Timing constants of the host. Fixed in production; tests construct
/// shorter values so timing assertions stay fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Cadence of the repeating poll while the surface is visible.
    pub poll_interval: Duration,
    /// Delay before the single retry fetch after a transient failure.
    pub retry_delay: Duration,
    /// Consecutive failures tolerated before the error is surfaced.
    pub max_retries: u32,
    /// Wait after a successful kill before re-scanning, so the backend
    /// observes the process exit.
    pub settle_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3000),
            retry_delay: Duration::from_millis(1000),
            max_retries: 3,
            settle_delay: Duration::from_millis(500),
        }
    }
}

// ─── State ────────────────────────────────────────────────────────

/// Authoritative sync state, owned by the engine and published on a
/// watch channel. Consumers receive clones; the snapshot is shared by
/// `Arc` and replaced wholesale, never mutated in place.
#[derive(Debug, Clone)]
pub struct SyncState {
    pub snapshot: Arc<[ServerRecord]>,
    /// True until the first fetch completes, successfully or by
    /// exhausting its retries.
    pub is_loading: bool,
    /// Present only while retries are exhausted; cleared by the next
    /// successful fetch.
    pub last_error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            snapshot: Arc::from(Vec::new()),
            is_loading: true,
            last_error: None,
            last_update: None,
            consecutive_failures: 0,
        }
    }
}

/// Result of one `refresh()` call. The scheduler arms its retry timer on
/// `Transient` and falls back to normal cadence on everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetch succeeded and the snapshot was swapped.
    Replaced,
    /// Fetch succeeded but the fingerprint sequence was identical; the
    /// held snapshot (same `Arc`) stays.
    Unchanged,
    /// Another fetch was already in flight; this request was dropped,
    /// not queued.
    Dropped,
    /// Fetch failed below the retry cap. State is untouched apart from
    /// the failure counter.
    Transient,
    /// Fetch failed at the retry cap; the failure is now surfaced via
    /// `last_error` while the stale snapshot stays visible.
    Exhausted,
}

// ─── Engine ───────────────────────────────────────────────────────

/// Cheap-to-clone handle; all clones share one engine.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    directory: Arc<dyn ProcessDirectory>,
    policy: PollPolicy,
    state_tx: watch::Sender<SyncState>,
    /// Concurrent-call guard: at most one fetch in flight.
    in_flight: AtomicBool,
    /// Cancels pending settle refreshes on teardown.
    cancel: CancellationToken,
}

impl SyncEngine {
    pub fn new(directory: Arc<dyn ProcessDirectory>, policy: PollPolicy) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                directory,
                policy,
                state_tx: watch::channel(SyncState::default()).0,
                in_flight: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.inner.policy
    }

    /// Current state snapshot.
    pub fn state(&self) -> SyncState {
        self.inner.state_tx.borrow().clone()
    }

    /// Watch receiver for state changes. Every successful fetch notifies
    /// (`last_update` moves); consumers that only care about list changes
    /// compare snapshots by `Arc::ptr_eq`.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state_tx.subscribe()
    }

    /// Cancel pending settle refreshes. Safe to call more than once.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Run one fetch cycle. If a cycle is already running the call is a
    /// no-op returning [`FetchOutcome::Dropped`]; rapid external refresh
    /// triggers must not pile up concurrent backend calls.
    pub async fn refresh(&self) -> FetchOutcome {
        self.inner.refresh().await
    }

    /// Terminate a process through the backend. A successful call
    /// schedules one settle-delayed refresh so the next scan observes the
    /// exit; a failed call propagates to the caller for per-item
    /// reporting and is never retried here.
    pub async fn terminate(&self, pid: u32) -> Result<bool, DirectoryError> {
        let killed = self
            .inner
            .directory
            .kill_process(pid)
            .await
            .inspect_err(|err| {
                warn!(pid, "kill request failed: {err}");
            })?;

        if !killed {
            debug!(pid, "backend declined to terminate process");
        }

        let inner = Arc::clone(&self.inner);
        let cancel = self.inner.cancel.child_token();
        let settle = self.inner.policy.settle_delay;
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(settle) => {
                    inner.refresh().await;
                }
            }
        });

        Ok(killed)
    }

    /// Open the port in the user's browser. Best-effort: a failure is
    /// logged and never touches `SyncState`.
    pub async fn open_externally(&self, port: u16) {
        if let Err(err) = self.inner.directory.open_browser(port).await {
            warn!(port, "failed to open browser: {err}");
        }
    }
}

impl EngineInner {
    async fn refresh(&self) -> FetchOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("refresh dropped: fetch already in flight");
            return FetchOutcome::Dropped;
        }

        let outcome = match self.directory.get_servers().await {
            Ok(servers) => self.apply_success(servers),
            Err(err) => self.apply_failure(&err),
        };

        self.in_flight.store(false, Ordering::Release);
        outcome
    }

    fn apply_success(&self, servers: Vec<ServerRecord>) -> FetchOutcome {
        let now = Utc::now();
        let mut outcome = FetchOutcome::Unchanged;
        self.state_tx.send_modify(|state| {
            if should_replace(&state.snapshot, &servers) {
                state.snapshot = Arc::from(servers);
                outcome = FetchOutcome::Replaced;
            }
            state.is_loading = false;
            state.last_error = None;
            state.last_update = Some(now);
            state.consecutive_failures = 0;
        });
        match outcome {
            FetchOutcome::Replaced => debug!("snapshot replaced"),
            _ => debug!("snapshot unchanged"),
        }
        outcome
    }

    fn apply_failure(&self, err: &DirectoryError) -> FetchOutcome {
        let message = err.to_string();
        let mut outcome = FetchOutcome::Transient;
        let mut failures = 0;
        self.state_tx.send_modify(|state| {
            state.consecutive_failures += 1;
            failures = state.consecutive_failures;
            if state.consecutive_failures >= self.policy.max_retries {
                // Stale-but-visible: the last good snapshot stays; only
                // the error banner state changes.
                state.last_error = Some(message.clone());
                state.is_loading = false;
                outcome = FetchOutcome::Exhausted;
            }
        });
        match outcome {
            FetchOutcome::Exhausted => {
                warn!(failures, "fetch failed, retries exhausted: {err}");
            }
            _ => warn!(failures, "fetch failed, will retry: {err}"),
        }
        outcome
    }
}

// ─── Tests ────────────────────────────────────────────────────────
