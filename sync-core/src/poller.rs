//! Poll loop state machine.
//!
//! Pure, side-effect-free description of the poller lifecycle:
//!
//! ```text
//! Idle ──Start──► Running(1) ──CycleFinished──► Sleeping(1) ──TimerFired──► Running(2) ─► …
//!   │                 │                             │
//!   └──────────── ShutdownRequested (any state) ───┴──────────────► Stopped
//! ```
//!
//! The driver in sync-client executes the returned [`PollAction`]s. Cycles
//! never overlap: a new cycle only starts from `Sleeping`, which is only
//! entered once the previous cycle has finished or failed.

/// Poller lifecycle state - NO I/O, just transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// Not started.
    #[default]
    Idle,
    /// A sync cycle is in flight.
    Running {
        /// 1-based cycle number.
        cycle: u64,
    },
    /// Waiting for the interval to elapse.
    Sleeping {
        /// The cycle that last completed.
        completed: u64,
    },
    /// Terminal: shutdown was requested.
    Stopped,
}

/// Events fed into the poller state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The driver started the loop.
    Start,
    /// The in-flight cycle returned a result (any action, including Error).
    CycleFinished,
    /// The in-flight cycle died without a result (panic, join failure).
    CycleFailed {
        /// Description of the failure.
        error: String,
    },
    /// The sleep interval elapsed.
    TimerFired,
    /// Cancellation was requested.
    ShutdownRequested,
}

/// Instructions for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollAction {
    /// Run sync cycle number `cycle`.
    RunCycle {
        /// 1-based cycle number.
        cycle: u64,
    },
    /// Sleep for the configured interval.
    StartTimer,
    /// Record a cycle that died without a result.
    LogFailure {
        /// Cycle number.
        cycle: u64,
        /// Description of the failure.
        error: String,
    },
    /// Abort the in-flight cycle.
    AbortCycle,
    /// Leave the loop.
    Stop,
}

impl PollState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: PollEvent) -> (Self, Vec<PollAction>) {
        match (self, event) {
            (Self::Stopped, _) => (Self::Stopped, vec![]),

            (Self::Idle, PollEvent::Start) => (
                Self::Running { cycle: 1 },
                vec![PollAction::RunCycle { cycle: 1 }],
            ),

            (Self::Running { cycle }, PollEvent::CycleFinished) => (
                Self::Sleeping { completed: cycle },
                vec![PollAction::StartTimer],
            ),
            (Self::Running { cycle }, PollEvent::CycleFailed { error }) => (
                Self::Sleeping { completed: cycle },
                vec![
                    PollAction::LogFailure { cycle, error },
                    PollAction::StartTimer,
                ],
            ),
            (Self::Running { .. }, PollEvent::ShutdownRequested) => (
                Self::Stopped,
                vec![PollAction::AbortCycle, PollAction::Stop],
            ),

            (Self::Sleeping { completed }, PollEvent::TimerFired) => {
                let cycle = completed.saturating_add(1);
                (Self::Running { cycle }, vec![PollAction::RunCycle { cycle }])
            }

            (Self::Idle | Self::Sleeping { .. }, PollEvent::ShutdownRequested) => {
                (Self::Stopped, vec![PollAction::Stop])
            }

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a cycle is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Check if the loop has terminated.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Number of cycles started so far.
    pub fn cycles_started(&self) -> u64 {
        match self {
            Self::Idle | Self::Stopped => 0,
            Self::Running { cycle } => *cycle,
            Self::Sleeping { completed } => *completed,
        }
    }
}
