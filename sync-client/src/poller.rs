//! Poller - runs sync cycles on a fixed interval until shut down.
//!
//! The loop is driven by the pure [`PollState`] machine from sync-core; this
//! module only performs the I/O its actions ask for. Each cycle runs in its
//! own task so a panic inside one cycle cannot take the loop down, and so
//! shutdown can abort a cycle at its next await point.

use savesync_core::{PollAction, PollEvent, PollState, SyncAction, SyncResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::engine::SyncEngine;

/// Create a linked shutdown trigger and signal.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (
        ShutdownHandle { tx: Arc::new(tx) },
        ShutdownSignal { rx },
    )
}

/// Triggers shutdown. Clones share the trigger.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Request shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes shutdown. Dropping every [`ShutdownHandle`] also counts as
/// shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Check without waiting.
    pub fn is_shutdown(&self) -> bool {
        let requested = *self.rx.borrow();
        requested || self.rx.has_changed().is_err()
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&mut self) {
        // Err means every sender is gone
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Per-action cycle counts for one poller run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Cycles started.
    pub cycles: u64,
    /// Cycles that uploaded.
    pub uploads: u64,
    /// Cycles that downloaded.
    pub downloads: u64,
    /// Cycles with nothing to do.
    pub none: u64,
    /// Cycles skipped because the game was running.
    pub skipped: u64,
    /// Cycles that returned an error result.
    pub errors: u64,
    /// Cycles that died without a result.
    pub failed: u64,
}

impl PollStats {
    fn record(&mut self, result: &SyncResult) {
        match result.action {
            SyncAction::Upload => self.uploads += 1,
            SyncAction::Download => self.downloads += 1,
            SyncAction::None => self.none += 1,
            SyncAction::Skipped => self.skipped += 1,
            SyncAction::Error => self.errors += 1,
        }
    }
}

impl fmt::Display for PollStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles ({} uploads, {} downloads, {} idle, {} skipped, {} errors, {} failed)",
            self.cycles,
            self.uploads,
            self.downloads,
            self.none,
            self.skipped,
            self.errors,
            self.failed
        )
    }
}

/// Runs [`SyncEngine::synchronize`] every `interval`.
pub struct Poller {
    engine: Arc<SyncEngine>,
    interval: Duration,
}

impl Poller {
    /// Create a poller.
    pub fn new(engine: Arc<SyncEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// The sleep between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single cycle now (manual trigger).
    ///
    /// Waits for an in-flight poller cycle to finish first.
    pub async fn run_once(&self) -> SyncResult {
        self.engine.synchronize().await
    }

    /// Run cycles until `shutdown` fires. Returns the run's statistics.
    pub async fn run(&self, mut shutdown: ShutdownSignal) -> PollStats {
        tracing::info!(
            "Poller started: every {:?} against {}",
            self.interval,
            self.engine.store_description()
        );

        let mut state = PollState::new();
        let mut stats = PollStats::default();
        let mut in_flight: Option<JoinHandle<SyncResult>> = None;
        let mut event = PollEvent::Start;

        loop {
            let (next_state, actions) = state.on_event(event);
            state = next_state;

            let mut next_event = None;
            for action in actions {
                match action {
                    PollAction::RunCycle { cycle } => {
                        next_event = Some(
                            self.drive_cycle(cycle, &mut shutdown, &mut stats, &mut in_flight)
                                .await,
                        );
                    }
                    PollAction::StartTimer => {
                        next_event = Some(self.sleep(&mut shutdown).await);
                    }
                    PollAction::LogFailure { cycle, error } => {
                        stats.failed += 1;
                        tracing::error!("Sync cycle {} died: {}", cycle, error);
                    }
                    PollAction::AbortCycle => {
                        if let Some(handle) = in_flight.take() {
                            tracing::info!("Aborting in-flight sync cycle");
                            handle.abort();
                        }
                    }
                    PollAction::Stop => {
                        tracing::info!("Poller stopped after {}", stats);
                        return stats;
                    }
                }
            }

            match next_event {
                Some(e) => event = e,
                None => {
                    // Only reachable if the state machine stalls
                    tracing::warn!("Poller state {:?} produced no next event", state);
                    return stats;
                }
            }
        }
    }

    async fn drive_cycle(
        &self,
        cycle: u64,
        shutdown: &mut ShutdownSignal,
        stats: &mut PollStats,
        in_flight: &mut Option<JoinHandle<SyncResult>>,
    ) -> PollEvent {
        if shutdown.is_shutdown() {
            return PollEvent::ShutdownRequested;
        }

        let engine = Arc::clone(&self.engine);
        let mut handle = tokio::spawn(
            async move { engine.synchronize().await }
                .instrument(tracing::info_span!("sync_cycle", cycle)),
        );
        stats.cycles += 1;

        let outcome = tokio::select! {
            biased;
            _ = shutdown.wait() => None,
            joined = &mut handle => Some(joined),
        };

        match outcome {
            None => {
                *in_flight = Some(handle);
                PollEvent::ShutdownRequested
            }
            Some(Ok(result)) => {
                stats.record(&result);
                PollEvent::CycleFinished
            }
            Some(Err(e)) => PollEvent::CycleFailed {
                error: e.to_string(),
            },
        }
    }

    async fn sleep(&self, shutdown: &mut ShutdownSignal) -> PollEvent {
        tokio::select! {
            biased;
            _ = shutdown.wait() => PollEvent::ShutdownRequested,
            _ = tokio::time::sleep(self.interval) => PollEvent::TimerFired,
        }
    }
}
