use std::{
    ffi::OsString,
    io::{BufRead, BufReader, Read},
    path::Path,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use super::{FlashError, Programmer, FLASH_CRITICAL_LOG_TARGET, FLASH_LOG_TARGET};
use crate::core::config::FlashConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Split a line printed by the tool into a log target, level and message.
///
/// The tool prefixes its own log records with the Python level name;
/// unprefixed stdout lines are progress output, unprefixed stderr lines are
/// treated as warnings.
pub fn parse_tool_line(line: &str, from_stderr: bool) -> (&'static str, log::Level, &str) {
    const PREFIXES: [(&str, &str, log::Level); 5] = [
        ("CRITICAL:", FLASH_CRITICAL_LOG_TARGET, log::Level::Error),
        ("ERROR:", FLASH_LOG_TARGET, log::Level::Error),
        ("WARNING:", FLASH_LOG_TARGET, log::Level::Warn),
        ("INFO:", FLASH_LOG_TARGET, log::Level::Info),
        ("DEBUG:", FLASH_LOG_TARGET, log::Level::Debug),
    ];

    for (prefix, target, level) in PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return (target, level, rest.trim());
        }
    }

    let level = if from_stderr {
        log::Level::Warn
    } else {
        log::Level::Info
    };
    (FLASH_LOG_TARGET, level, line.trim())
}

/// Programmer backed by the `pymcuprog` command-line tool over a serial
/// UPDI adapter.
///
/// `flash.timeout_secs` bounds the whole session: the deadline starts at
/// `connect` and every tool action shares it.
pub struct PymcuprogProgrammer {
    config: FlashConfig,
    port: Option<String>,
    device: Option<String>,
    deadline: Option<Instant>,
}

impl PymcuprogProgrammer {
    pub fn new(config: FlashConfig) -> Self {
        Self {
            config,
            port: None,
            device: None,
            deadline: None,
        }
    }

    fn command_args(&self, action: &str) -> Result<Vec<OsString>, FlashError> {
        let (Some(port), Some(device)) = (self.port.as_ref(), self.device.as_ref()) else {
            return Err(FlashError::NoSession);
        };

        let mut args: Vec<OsString> = vec![
            action.into(),
            "-t".into(),
            self.config.tool.as_str().into(),
            "-u".into(),
            port.into(),
            "-d".into(),
            device.into(),
        ];
        args.extend(self.config.extra_args.iter().map(OsString::from));
        Ok(args)
    }

    /// Run one tool action, forwarding its output into the log as it arrives.
    fn run(&self, action: &'static str, extra: &[OsString]) -> Result<Vec<String>, FlashError> {
        let mut args = self.command_args(action)?;
        args.extend(extra.iter().cloned());

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let deadline = self.deadline.unwrap_or_else(|| Instant::now() + timeout);
        if Instant::now() >= deadline {
            return Err(FlashError::Timeout { action, timeout });
        }

        log::debug!("running {} {:?}", self.config.program, args);
        let launch_error = |source| FlashError::Launch {
            program: self.config.program.clone(),
            source,
        };

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_error)?;

        let (line_tx, line_rx) = flume::unbounded();
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, Stream::Stdout, line_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, Stream::Stderr, line_tx.clone());
        }
        // Readers hold the only senders; the channel disconnects once both
        // pipes are closed.
        drop(line_tx);

        let mut lines = Vec::new();

        loop {
            match line_rx.recv_timeout(Duration::from_millis(50)) {
                Ok((stream, line)) => {
                    let (target, level, message) =
                        parse_tool_line(&line, stream == Stream::Stderr);
                    if !message.is_empty() {
                        log::log!(target: target, level, "{message}");
                    }
                    lines.push(line);
                }
                Err(flume::RecvTimeoutError::Timeout) => {
                    if Instant::now() >= deadline {
                        if let Err(err) = child.kill() {
                            log::warn!("failed to kill {}: {err}", self.config.program);
                        }
                        let _ = child.wait();
                        return Err(FlashError::Timeout { action, timeout });
                    }
                }
                Err(flume::RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = child.wait().map_err(launch_error)?;
        if !status.success() {
            return Err(FlashError::ToolFailed { action, status });
        }
        Ok(lines)
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(
    pipe: R,
    stream: Stream,
    tx: flume::Sender<(Stream, String)>,
) {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim_end_matches(['\r', '\n']);
                    if !trimmed.is_empty() && tx.send((stream, trimmed.to_string())).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::warn!("programmer {stream:?} reader error: {err}");
                    break;
                }
            }
        }
    });
}

impl Programmer for PymcuprogProgrammer {
    fn connect(&mut self, port: &str) -> Result<(), FlashError> {
        // Only checks that the adapter opens; the tool reopens it per action.
        serialport::new(port, self.config.baud_rate)
            .timeout(Duration::from_secs(1))
            .open()
            .map_err(|source| FlashError::Connect {
                port: port.to_string(),
                source,
            })?;
        log::info!(target: FLASH_LOG_TARGET, "Connected to programming tool on {port}");
        self.port = Some(port.to_string());
        self.deadline = Some(Instant::now() + Duration::from_secs(self.config.timeout_secs));
        Ok(())
    }

    fn start_session(&mut self, device: &str) -> Result<(), FlashError> {
        if self.port.is_none() {
            return Err(FlashError::NoSession);
        }
        self.device = Some(device.to_string());
        log::debug!("programming session configured for {device}");
        Ok(())
    }

    fn read_device_id(&mut self) -> Result<String, FlashError> {
        let lines = self.run("ping", &[])?;
        Ok(lines
            .iter()
            .find_map(|line| {
                line.split_once("Ping response:")
                    .map(|(_, id)| id.trim().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string()))
    }

    fn erase_all(&mut self) -> Result<(), FlashError> {
        self.run("erase", &[]).map(|_| ())
    }

    fn write_image(&mut self, image: &Path) -> Result<(), FlashError> {
        self.run("write", &["-f".into(), image.as_os_str().to_owned()])
            .map(|_| ())
    }

    fn verify_image(&mut self, image: &Path) -> Result<(), FlashError> {
        let lines = self.run("verify", &["-f".into(), image.as_os_str().to_owned()])?;
        match lines.iter().find(|line| line.contains("Verify failed")) {
            Some(line) => Err(FlashError::Verify(line.clone())),
            None => Ok(()),
        }
    }
}
