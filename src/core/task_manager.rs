/// Background worker threads
///
/// Every submission gets its own OS thread. The UI only ever asks a
/// [`WorkerHandle`] whether the thread is still alive and reaps it once it
/// is not.
use std::thread::{self, JoinHandle};

use crate::core::{error::TaskKind, output::OutputQueue};

/// A blocking unit of work that reports through an output queue.
pub trait Task: Send + 'static {
    fn kind(&self) -> TaskKind;

    /// Run to completion on the worker thread. Every failure must be turned
    /// into an output line here; nothing is returned to the UI thread.
    fn run(self, output: OutputQueue);
}

pub struct WorkerHandle {
    kind: TaskKind,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Wait for the thread and report whether it ended by panicking.
    pub fn join(self) -> Result<(), String> {
        self.handle.join().map_err(|payload| {
            payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string())
        })
    }
}

/// Spawn a task on a dedicated, named thread.
pub fn spawn_task<T: Task>(task: T, output: OutputQueue) -> std::io::Result<WorkerHandle> {
    let kind = task.kind();
    let handle = thread::Builder::new()
        .name(format!("{kind}-worker"))
        .spawn(move || task.run(output))?;
    log::debug!("spawned {kind} worker");
    Ok(WorkerHandle { kind, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::{OutputSink, Severity};
    use std::time::Duration;

    struct Sleepy(Duration);

    impl Task for Sleepy {
        fn kind(&self) -> TaskKind {
            TaskKind::Test
        }

        fn run(self, output: OutputQueue) {
            thread::sleep(self.0);
            output.enqueue("done", Severity::Success);
        }
    }

    struct Boom;

    impl Task for Boom {
        fn kind(&self) -> TaskKind {
            TaskKind::Flash
        }

        fn run(self, _output: OutputQueue) {
            panic!("boom");
        }
    }

    #[test]
    fn worker_reports_liveness_and_output() {
        let mut sink = OutputSink::new();
        let worker = spawn_task(Sleepy(Duration::from_millis(50)), sink.queue()).unwrap();
        assert_eq!(worker.kind(), TaskKind::Test);
        assert!(worker.join().is_ok());
        sink.drain();
        assert_eq!(sink.lines()[0].text, "done");
    }

    #[test]
    fn panicking_worker_is_reported_on_join() {
        let sink = OutputSink::new();
        let worker = spawn_task(Boom, sink.queue()).unwrap();
        assert_eq!(worker.join().unwrap_err(), "boom");
    }
}
