//! Poll scheduler: decides *when* the engine's fetch cycle runs.
//!
//! Active state polls on a fixed interval with an immediate first tick.
//! A hidden surface suspends polling entirely (the interval is dropped);
//! becoming visible again re-enters the active loop, whose immediate
//! first tick doubles as the mandated refresh-on-resume. A transient
//! fetch failure arms a one-shot retry deadline that suppresses the main
//! interval until it resolves, so fetches never overlap.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{FetchOutcome, SyncEngine};

pub struct PollScheduler {
    engine: SyncEngine,
    /// Host visibility signal: `true` means the surface is hidden.
    visibility: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl PollScheduler {
    pub fn new(engine: SyncEngine, visibility: watch::Receiver<bool>) -> Self {
        Self::with_cancel(engine, visibility, CancellationToken::new())
    }

    /// Create a scheduler with an explicit cancellation token for
    /// deterministic teardown.
    pub fn with_cancel(
        engine: SyncEngine,
        visibility: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine,
            visibility,
            cancel,
        }
    }

    /// Drive the engine until cancelled or the visibility sender is gone.
    /// All timer state lives on this task's stack; nothing outlives the
    /// call.
    pub async fn run(mut self) {
        loop {
            if *self.visibility.borrow_and_update() {
                tokio::select! {
                    () = self.cancel.cancelled() => return,
                    changed = self.visibility.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
                continue;
            }
            if self.run_active().await.is_break() {
                return;
            }
        }
    }

    /// The Active loop. Returns `Continue` to re-enter via the suspended
    /// path when the surface hides, `Break` on teardown.
    async fn run_active(&mut self) -> ControlFlow<()> {
        let policy = self.engine.policy();
        let mut ticker = time::interval(policy.poll_interval);
        // A tick suppressed by an outstanding retry is skipped, not
        // bursted: a resolved retry must not be chased by a catch-up
        // fetch.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut retry_at: Option<Instant> = None;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return ControlFlow::Break(()),
                changed = self.visibility.changed() => {
                    if changed.is_err() {
                        return ControlFlow::Break(());
                    }
                    if *self.visibility.borrow() {
                        debug!("surface hidden, polling suspended");
                        return ControlFlow::Continue(());
                    }
                }
                _ = ticker.tick(), if retry_at.is_none() => {
                    retry_at = self.fetch(policy.retry_delay).await;
                }
                () = time::sleep_until(retry_at.unwrap_or_else(Instant::now)),
                        if retry_at.is_some() => {
                    debug!("retrying failed fetch");
                    retry_at = self.fetch(policy.retry_delay).await;
                }
            }
        }
    }

    /// One fetch cycle. Returns the armed retry deadline when the
    /// failure is transient; everything else falls back to the normal
    /// cadence (an exhausted failure is surfaced by the engine and
    /// recovers on the next successful scheduled poll).
    async fn fetch(&self, retry_delay: Duration) -> Option<Instant> {
        match self.engine.refresh().await {
            FetchOutcome::Transient => Some(Instant::now() + retry_delay),
            _ => None,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, ProcessDirectory};
    use crate::engine::PollPolicy;
    use portdock_core::{Category, ServerRecord};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
    use tokio::task::JoinHandle;

    /// Backend fake that fails the first `failures` calls (`-1` = fail
    /// forever) and counts every `get_servers` invocation.
    struct ScriptedDirectory {
        failures: AtomicI32,
        get_calls: AtomicU32,
    }

    impl ScriptedDirectory {
        fn succeeding() -> Self {
            Self::failing_first(0)
        }

        fn failing_first(failures: i32) -> Self {
            Self {
                failures: AtomicI32::new(failures),
                get_calls: AtomicU32::new(0),
            }
        }

        fn always_failing() -> Self {
            Self::failing_first(-1)
        }

        fn get_calls(&self) -> u32 {
            self.get_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ProcessDirectory for ScriptedDirectory {
        async fn get_servers(&self) -> Result<Vec<ServerRecord>, DirectoryError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining != 0 {
                if remaining > 0 {
                    self.failures.fetch_sub(1, Ordering::SeqCst);
                }
                return Err(DirectoryError::Unreachable("down".to_string()));
            }
            Ok(vec![ServerRecord {
                pid: 1,
                port: 3000,
                project_name: "proj".to_string(),
                framework: String::new(),
                uptime_seconds: 5,
                process_name: "node".to_string(),
                category: Category::Dev,
                description: "Node.js".to_string(),
            }])
        }

        async fn kill_process(&self, _pid: u32) -> Result<bool, DirectoryError> {
            Ok(true)
        }

        async fn open_browser(&self, _port: u16) -> Result<(), DirectoryError> {
            Ok(())
        }
    }

    fn policy(interval_ms: u64, retry_ms: u64, max_retries: u32) -> PollPolicy {
        PollPolicy {
            poll_interval: Duration::from_millis(interval_ms),
            retry_delay: Duration::from_millis(retry_ms),
            max_retries,
            settle_delay: Duration::from_millis(20),
        }
    }

    fn start(
        directory: Arc<ScriptedDirectory>,
        policy: PollPolicy,
        hidden: bool,
    ) -> (
        SyncEngine,
        watch::Sender<bool>,
        CancellationToken,
        JoinHandle<()>,
    ) {
        let engine = SyncEngine::new(directory, policy);
        let (vis_tx, vis_rx) = watch::channel(hidden);
        let cancel = CancellationToken::new();
        let scheduler = PollScheduler::with_cancel(engine.clone(), vis_rx, cancel.clone());
        let handle = tokio::spawn(scheduler.run());
        (engine, vis_tx, cancel, handle)
    }

    // ── Cadence ─────────────────────────────────────────────────

    #[tokio::test]
    async fn first_fetch_is_immediate() {
        let dir = Arc::new(ScriptedDirectory::succeeding());
        let (_engine, _vis, cancel, handle) = start(dir.clone(), policy(5_000, 100, 3), false);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(dir.get_calls(), 1, "no initial-interval wait before first data");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn interval_keeps_fetching() {
        let dir = Arc::new(ScriptedDirectory::succeeding());
        let (_engine, _vis, cancel, handle) = start(dir.clone(), policy(30, 100, 3), false);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(
            dir.get_calls() >= 4,
            "expected repeated polls, got {}",
            dir.get_calls()
        );

        cancel.cancel();
        handle.await.unwrap();
    }

    // ── Visibility ──────────────────────────────────────────────

    #[tokio::test]
    async fn hidden_surface_polls_nothing() {
        let dir = Arc::new(ScriptedDirectory::succeeding());
        let (_engine, _vis, cancel, handle) = start(dir.clone(), policy(20, 100, 3), true);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(dir.get_calls(), 0, "no backend calls while hidden");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn resume_fetches_once_before_next_tick() {
        let dir = Arc::new(ScriptedDirectory::succeeding());
        let (_engine, vis, cancel, handle) = start(dir.clone(), policy(5_000, 100, 3), true);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(dir.get_calls(), 0);

        vis.send(false).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(
            dir.get_calls(),
            1,
            "exactly one immediate fetch on regained visibility"
        );

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn hiding_stops_further_fetches() {
        let dir = Arc::new(ScriptedDirectory::succeeding());
        let (_engine, vis, cancel, handle) = start(dir.clone(), policy(30, 100, 3), false);

        tokio::time::sleep(Duration::from_millis(50)).await;
        vis.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let calls_when_hidden = dir.get_calls();
        assert!(calls_when_hidden >= 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(dir.get_calls(), calls_when_hidden, "suspended timer is cancelled");

        cancel.cancel();
        handle.await.unwrap();
    }

    // ── Retry ───────────────────────────────────────────────────

    #[tokio::test]
    async fn transient_failure_retries_ahead_of_interval() {
        // Interval far beyond the test window: any second call proves the
        // one-shot retry path fired.
        let dir = Arc::new(ScriptedDirectory::failing_first(1));
        let (engine, _vis, cancel, handle) = start(dir.clone(), policy(5_000, 20, 3), false);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(dir.get_calls(), 2, "initial fetch plus exactly one retry");
        let state = engine.state();
        assert!(state.last_error.is_none(), "recovered before the cap");
        assert_eq!(state.snapshot.len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn consecutive_failures_retry_until_exhausted() {
        let dir = Arc::new(ScriptedDirectory::always_failing());
        let (engine, _vis, cancel, handle) = start(dir.clone(), policy(5_000, 20, 3), false);

        tokio::time::sleep(Duration::from_millis(250)).await;
        // Initial fetch + two retries reach the cap of 3; after that the
        // scheduler stops auto-retrying until the next interval tick
        // (far outside this window).
        assert_eq!(dir.get_calls(), 3, "retries stop at the cap");
        assert!(engine.state().last_error.is_some());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn exhausted_failure_does_not_arm_retry() {
        let dir = Arc::new(ScriptedDirectory::always_failing());
        let (engine, _vis, cancel, handle) = start(dir.clone(), policy(5_000, 20, 1), false);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(dir.get_calls(), 1, "cap of 1 means no retry at all");
        assert!(engine.state().last_error.is_some());

        cancel.cancel();
        handle.await.unwrap();
    }

    // ── Teardown ────────────────────────────────────────────────

    #[tokio::test]
    async fn cancel_stops_polling() {
        let dir = Arc::new(ScriptedDirectory::succeeding());
        let (_engine, _vis, cancel, handle) = start(dir.clone(), policy(30, 100, 3), false);

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        let calls_after_cancel = dir.get_calls();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(dir.get_calls(), calls_after_cancel, "no fetches after teardown");
    }

    #[tokio::test]
    async fn dropped_visibility_sender_ends_the_loop() {
        let dir = Arc::new(ScriptedDirectory::succeeding());
        let (_engine, vis, _cancel, handle) = start(dir, policy(30, 100, 3), false);

        drop(vis);
        tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("scheduler should exit when the host is gone")
            .unwrap();
    }
}
