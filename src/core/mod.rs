/// Frontend-independent bench logic
///
/// Both the desktop window and the terminal UI drive a [`bench::Bench`]:
/// - `controller` owns a pane's worker and poll tick
/// - `output` is the per-pane log and its delivery channel
/// - `flash` and `probe_test` are the two worker tasks
/// - `logs` bridges programmer log records into the flash pane
pub mod bench;
pub mod config;
pub mod controller;
pub mod error;
pub mod flash;
pub mod logs;
pub mod output;
pub mod registry;
pub mod task_manager;
pub mod ticker;

pub use bench::{Bench, BenchTick};
pub use config::BenchConfig;
pub use controller::{ControllerState, SubmitController, SubmitOutcome, TickOutcome};
pub use error::{BenchError, TaskKind};
pub use output::{OutputLine, OutputQueue, OutputSink, Severity};
