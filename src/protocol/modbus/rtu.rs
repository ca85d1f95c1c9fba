use std::{
    io::{self, BufRead, BufReader, Read, Write},
    time::Duration,
};

use rmodbus::{guess_response_frame_len, ModbusProto};

use super::{
    request::{
        generate_get_state_request, generate_set_command_request, parse_get_state,
        parse_set_command,
    },
    Connector, ProbeError, ProbeLink,
};
use crate::core::config::ProbeConfig;

/// Byte stream the RTU link runs over.
pub trait ProbeStream: Read + Write + Send {
    /// Drop whatever input is pending, such as a late reply to an earlier
    /// request that already timed out.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl ProbeStream for Box<dyn serialport::SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }
}

/// Modbus RTU link to the probe over any byte stream.
///
/// In production the stream is a serial port; the generic parameter keeps
/// the framing testable against an in-memory stream. Pending input is
/// discarded before every request so each reply is matched to the request
/// that was just written.
pub struct RtuProbe<S> {
    port_name: String,
    stream: S,
    station_id: u8,
    command_coil: u16,
    state_register: u16,
    timeout: Duration,
}

impl<S: ProbeStream> RtuProbe<S> {
    pub fn new(port_name: impl Into<String>, stream: S, config: &ProbeConfig) -> Self {
        Self {
            port_name: port_name.into(),
            stream,
            station_id: config.station_id,
            command_coil: config.command_coil,
            state_register: config.state_register,
            timeout: Duration::from_millis(config.response_timeout_ms),
        }
    }

    fn map_io(&self, err: io::Error) -> ProbeError {
        if err.kind() == io::ErrorKind::TimedOut {
            ProbeError::Timeout(self.timeout)
        } else {
            ProbeError::Io(err)
        }
    }

    fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>, ProbeError> {
        self.stream
            .discard_input()
            .map_err(|err| self.map_io(err))?;
        self.stream
            .write_all(frame)
            .and_then(|_| self.stream.flush())
            .map_err(|err| self.map_io(err))?;

        // Station, function and the byte-count/exception byte are enough to
        // size the rest of the frame.
        let mut response = vec![0u8; 3];
        self.stream
            .read_exact(&mut response)
            .map_err(|err| self.map_io(err))?;

        let total = guess_response_frame_len(&response, ModbusProto::Rtu)
            .map_err(|err| ProbeError::Protocol(err.to_string()))? as usize;
        if total > response.len() {
            response.resize(total, 0);
            self.stream
                .read_exact(&mut response[3..])
                .map_err(|err| self.map_io(err))?;
        }

        log::trace!("{} <- {:02x?}", self.port_name, response);
        Ok(response)
    }
}

impl<S: ProbeStream> ProbeLink for RtuProbe<S> {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn write_command(&mut self, start: bool) -> Result<(), ProbeError> {
        let (request, frame) =
            generate_set_command_request(self.station_id, self.command_coil, start)?;
        let response = self.exchange(&frame)?;
        parse_set_command(&request, &response)
    }

    fn read_state(&mut self) -> Result<u16, ProbeError> {
        let (request, frame) = generate_get_state_request(self.station_id, self.state_register)?;
        let response = self.exchange(&frame)?;
        parse_get_state(&request, &response)
    }
}

/// Opens serial-port backed links using the probe settings.
#[derive(Debug, Clone)]
pub struct RtuConnector {
    config: ProbeConfig,
}

impl RtuConnector {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

impl Connector for RtuConnector {
    fn connect(&self, port: &str) -> Result<Box<dyn ProbeLink>, ProbeError> {
        let timeout = Duration::from_millis(self.config.response_timeout_ms);
        let mut handle = serialport::new(port, self.config.baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| ProbeError::Open {
                port: port.to_string(),
                source,
            })?;

        handle
            .clear(serialport::ClearBuffer::Input)
            .map_err(|source| ProbeError::Open {
                port: port.to_string(),
                source,
            })?;

        // The probe prints a banner line after reset; consume whatever is
        // pending so it does not corrupt the first response.
        {
            let mut reader = BufReader::new(&mut handle);
            let mut banner = String::new();
            match reader.read_line(&mut banner) {
                Ok(_) => {
                    if !banner.trim().is_empty() {
                        log::debug!("{port} banner: {}", banner.trim_end());
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {}
                Err(err) => return Err(ProbeError::Io(err)),
            }
        }

        log::info!(
            "opened probe link on {port} at {} baud, station {}",
            self.config.baud_rate,
            self.config.station_id
        );
        Ok(Box::new(RtuProbe::new(port, handle, &self.config)))
    }
}
