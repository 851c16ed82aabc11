//! Single benchmark execution state machine.

use std::time::Duration;
use tokio::time::Instant;

use crate::bench::BenchmarkSpec;
use crate::driver::traits::BrowserSession;

/// Phases of one benchmark execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Started,
    Polling,
    Completed,
    TimedOut,
    Errored,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::TimedOut | ExecutionState::Errored
        )
    }
}

/// Drives one benchmark run on an already-launched session: issue the
/// start trigger once, poll the completion predicate under a wall-clock
/// deadline.
///
/// Holds no cross-execution state; the orchestrator builds a fresh
/// instance per (trial, benchmark, browser) triple.
pub struct BenchmarkExecution {
    deadline: Duration,
    poll_interval: Duration,
    state: ExecutionState,
}

impl BenchmarkExecution {
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(3600);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            state: ExecutionState::Idle,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Run to a terminal state. Only `Completed` permits result
    /// collection.
    pub async fn run(
        &mut self,
        session: &dyn BrowserSession,
        spec: &BenchmarkSpec,
    ) -> ExecutionState {
        log::info!("Starting benchmark...");
        if let Err(e) = spec.trigger_start(session).await {
            log::info!("Start trigger failed: {}", e);
            self.state = ExecutionState::Errored;
            return self.state;
        }
        self.state = ExecutionState::Started;

        let deadline = Instant::now() + self.deadline;
        self.state = ExecutionState::Polling;
        while Instant::now() < deadline {
            tokio::time::sleep(self.poll_interval).await;
            // The deadline wins over a `done` that would only be observed
            // after it has passed.
            if Instant::now() >= deadline {
                break;
            }
            match spec.is_done(session).await {
                Ok(true) => {
                    self.state = ExecutionState::Completed;
                    return self.state;
                }
                Ok(false) => {}
                // A transient evaluation error must not abort an
                // otherwise-healthy long-running benchmark.
                Err(e) => log::info!("Error checking benchmark status: {}", e),
            }
        }
        self.state = ExecutionState::TimedOut;
        self.state
    }
}
