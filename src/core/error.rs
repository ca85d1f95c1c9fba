use derive_more::{Display, Error};

use crate::protocol::modbus::ProbeError;

/// Which pane a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TaskKind {
    #[display("flash")]
    Flash,
    #[display("test")]
    Test,
}

/// Task-level outcomes. The `Display` form of each variant is exactly the
/// line shown to the user.
#[derive(Debug, Display, Error)]
pub enum BenchError {
    #[display("Invalid {_0} arguments")]
    InvalidArguments(#[error(not(source))] TaskKind),

    #[display("Connection failed with {port}")]
    Connection { port: String, source: ProbeError },

    #[display("Test start failed")]
    TestStart(ProbeError),

    #[display("Test interrupted for an exception")]
    TestInterrupted(ProbeError),

    #[display("{_0} flash failed")]
    FlashFailed(#[error(not(source))] String),
}
