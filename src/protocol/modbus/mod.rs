mod pool;
mod request;
mod rtu;

use derive_more::{Display, Error};
use std::time::Duration;

pub use pool::{ConnectionPool, SharedLink};
pub use request::{
    generate_get_state_request, generate_set_command_request, parse_get_state,
    parse_set_command,
};
pub use rtu::{ProbeStream, RtuConnector, RtuProbe};

#[derive(Debug, Display, Error)]
pub enum ProbeError {
    #[display("could not open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },
    #[display("no response within {_0:?}")]
    Timeout(#[error(not(source))] Duration),
    #[display("serial i/o failed: {_0}")]
    Io(std::io::Error),
    #[display("modbus exchange failed: {_0}")]
    Protocol(#[error(not(source))] String),
}

impl ProbeError {
    /// A single read that went unanswered. The link itself is still usable.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout(_))
    }
}

/// Register-level access to the probe's test firmware.
pub trait ProbeLink: Send {
    fn port_name(&self) -> &str;

    /// Write the command coil. `true` starts a test run.
    fn write_command(&mut self, start: bool) -> Result<(), ProbeError>;

    /// Read the raw value of the test state register.
    fn read_state(&mut self) -> Result<u16, ProbeError>;
}

/// Opens links by port name.
pub trait Connector: Send + Sync {
    fn connect(&self, port: &str) -> Result<Box<dyn ProbeLink>, ProbeError>;
}
