use std::time::{Duration, Instant};

use crate::core::{
    error::{BenchError, TaskKind},
    output::{OutputSink, Severity},
    task_manager::{spawn_task, Task, WorkerHandle},
    ticker::Ticker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A worker was spawned.
    Started,
    /// Input validation (or thread creation) failed; an error line was printed.
    Rejected,
    /// A worker is already in flight; nothing happened.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No worker is in flight.
    Idle,
    /// The worker was alive at the liveness snapshot; another tick is armed.
    Pending,
    /// The worker had finished; submission is enabled again.
    Finished,
}

/// Per-pane coordinator of validation, worker lifecycle and output polling.
pub struct SubmitController {
    kind: TaskKind,
    sink: OutputSink,
    worker: Option<WorkerHandle>,
    ticker: Ticker,
}

impl SubmitController {
    pub fn new(kind: TaskKind, poll_interval: Duration) -> Self {
        Self {
            kind,
            sink: OutputSink::new(),
            worker: None,
            ticker: Ticker::new(poll_interval),
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut OutputSink {
        &mut self.sink
    }

    pub fn state(&self) -> ControllerState {
        if self.worker.is_some() {
            ControllerState::Running
        } else {
            ControllerState::Idle
        }
    }

    /// Drives the enablement of the pane's submit control.
    pub fn is_submit_enabled(&self) -> bool {
        self.worker.is_none()
    }

    /// Start a new submission from already-validated input.
    ///
    /// `prepared` carries the outcome of input validation: an `Err` is
    /// printed to the pane and no thread is started.
    pub fn submit<T: Task>(&mut self, prepared: Result<T, BenchError>) -> SubmitOutcome {
        if !self.is_submit_enabled() {
            log::debug!("{} submit ignored while a worker is running", self.kind);
            return SubmitOutcome::Busy;
        }

        self.sink.clear();

        let task = match prepared {
            Ok(task) => task,
            Err(err) => {
                self.sink.print(err.to_string(), Severity::Error);
                return SubmitOutcome::Rejected;
            }
        };

        match spawn_task(task, self.sink.queue()) {
            Ok(worker) => {
                self.worker = Some(worker);
                self.ticker.arm(Instant::now());
                log::info!("{} task started", self.kind);
                SubmitOutcome::Started
            }
            Err(err) => {
                log::error!("failed to spawn {} worker: {err}", self.kind);
                self.sink
                    .print(format!("Could not start {} worker", self.kind), Severity::Error);
                SubmitOutcome::Rejected
            }
        }
    }

    /// Run the poll tick if its timer is due.
    pub fn poll(&mut self, now: Instant) -> TickOutcome {
        if self.ticker.fire(now) {
            self.tick_at(now)
        } else if self.worker.is_some() {
            TickOutcome::Pending
        } else {
            TickOutcome::Idle
        }
    }

    /// Run one poll tick immediately.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> TickOutcome {
        let Some(worker) = self.worker.as_ref() else {
            // Lines from a still-attached logging bridge may arrive between runs.
            self.sink.drain();
            return TickOutcome::Idle;
        };

        // Liveness is sampled before draining so the last lines of a worker
        // that exits mid-tick are still flushed by this drain.
        let alive = worker.is_alive();
        self.sink.drain();

        if alive {
            self.ticker.arm(now);
            return TickOutcome::Pending;
        }

        self.ticker.disarm();
        if let Some(worker) = self.worker.take() {
            if let Err(panic) = worker.join() {
                log::error!("{} worker panicked: {panic}", self.kind);
                self.sink.drain();
                self.sink
                    .print("Worker stopped unexpectedly", Severity::Critical);
            }
        }
        log::info!("{} task finished", self.kind);
        TickOutcome::Finished
    }

    /// Time until the next poll tick, if one is armed.
    pub fn next_wake(&self, now: Instant) -> Option<Duration> {
        self.ticker.remaining(now)
    }
}
