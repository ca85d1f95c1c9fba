//! Firmware programming backend
//!
//! The flash worker only knows the [`Programmer`] trait. The production
//! implementation drives the `pymcuprog` tool; tests use fakes.

mod pymcuprog;

use derive_more::{Display, Error};
use std::{path::Path, process::ExitStatus, time::Duration};

pub use pymcuprog::{parse_tool_line, PymcuprogProgrammer};

/// Target of every log record the programming backend emits. The logging
/// bridge forwards this target into the flash pane.
pub const FLASH_LOG_TARGET: &str = "probe_bench::flash";

/// Target for tool lines tagged `CRITICAL`. They are logged at error level
/// and shown in the pane with their own tag.
pub const FLASH_CRITICAL_LOG_TARGET: &str = "probe_bench::flash::critical";

#[derive(Debug, Display, Error)]
pub enum FlashError {
    #[display("could not open tool port {port}: {source}")]
    Connect {
        port: String,
        source: serialport::Error,
    },
    #[display("no programming session is active")]
    NoSession,
    #[display("failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
    #[display("{action} exited with {status}")]
    ToolFailed {
        action: &'static str,
        status: ExitStatus,
    },
    #[display("{action} did not finish within {timeout:?}")]
    Timeout {
        action: &'static str,
        timeout: Duration,
    },
    #[display("image verification failed: {_0}")]
    Verify(#[error(not(source))] String),
}

/// Step-wise access to a chip programmer.
pub trait Programmer: Send {
    /// Open the programming tool on `port`.
    fn connect(&mut self, port: &str) -> Result<(), FlashError>;

    /// Configure the session for the target device.
    fn start_session(&mut self, device: &str) -> Result<(), FlashError>;

    /// Ping the target; returns its signature as reported by the tool.
    fn read_device_id(&mut self) -> Result<String, FlashError>;

    fn erase_all(&mut self) -> Result<(), FlashError>;

    /// Program every memory segment of the image.
    fn write_image(&mut self, image: &Path) -> Result<(), FlashError>;

    /// Read back and compare every memory segment of the image.
    fn verify_image(&mut self, image: &Path) -> Result<(), FlashError>;
}

/// Builds a fresh programmer for each flash submission.
pub type ProgrammerFactory = std::sync::Arc<dyn Fn() -> Box<dyn Programmer> + Send + Sync>;

fn run_sequence(
    programmer: &mut dyn Programmer,
    device: &str,
    image: &Path,
    port: &str,
) -> Result<(), FlashError> {
    programmer.connect(port)?;
    programmer.start_session(device)?;
    let device_id = programmer.read_device_id()?;
    log::info!(target: FLASH_LOG_TARGET, "Device ID: {device_id}");
    programmer.erase_all()?;
    programmer.write_image(image)?;
    programmer.verify_image(image)?;
    Ok(())
}

/// Program `image` into the device behind `port`.
///
/// Every error is logged under [`FLASH_LOG_TARGET`] and collapsed into
/// `false`; there is no partial-success signal.
pub fn flash_file(programmer: &mut dyn Programmer, device: &str, image: &Path, port: &str) -> bool {
    match run_sequence(programmer, device, image, port) {
        Ok(()) => true,
        Err(err) => {
            log::error!(target: FLASH_LOG_TARGET, "{err}");
            false
        }
    }
}
