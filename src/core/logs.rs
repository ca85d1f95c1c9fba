/// Logging bridge between the `log` facade and the flash pane
///
/// The programming backend only knows `log`. Records it emits under
/// [`FLASH_LOG_TARGET`] (and [`FLASH_CRITICAL_LOG_TARGET`]) are copied into
/// whichever output queue is attached here, in addition to reaching the
/// regular `env_logger` sink.
use log::Log;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::{
    core::output::{OutputQueue, Severity},
    protocol::programmer::{FLASH_CRITICAL_LOG_TARGET, FLASH_LOG_TARGET},
};

static GLOBAL_BRIDGE: Lazy<LogBridge> = Lazy::new(LogBridge::new);

#[derive(Default)]
pub struct LogBridge {
    queue: Mutex<Option<OutputQueue>>,
}

impl LogBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bridge consulted by the installed process logger.
    pub fn global() -> &'static LogBridge {
        &GLOBAL_BRIDGE
    }

    /// Route bridged records into `queue`, replacing any previous queue.
    pub fn attach(&self, queue: OutputQueue) {
        *self.queue.lock() = Some(queue);
    }

    pub fn detach(&self) {
        *self.queue.lock() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.queue.lock().is_some()
    }

    /// Whether a record with this target and level would be forwarded.
    pub fn accepts(metadata: &log::Metadata) -> bool {
        classify(metadata).is_some()
    }

    /// Copy `record` into the attached queue. Returns `true` when it was
    /// forwarded.
    pub fn forward(&self, record: &log::Record) -> bool {
        let Some((name, severity)) = classify(record.metadata()) else {
            return false;
        };
        let guard = self.queue.lock();
        let Some(queue) = guard.as_ref() else {
            return false;
        };

        let formatted = format!("{name}: {}", record.args());
        enqueue_split(queue, &formatted, severity);
        true
    }
}

/// Pane tag and level name for a bridged record, `None` when it stays out of
/// the pane.
fn classify(metadata: &log::Metadata) -> Option<(&'static str, Severity)> {
    match metadata.target() {
        FLASH_CRITICAL_LOG_TARGET => Some(("CRITICAL", Severity::Critical)),
        FLASH_LOG_TARGET => {
            let level = metadata.level();
            Severity::from_log_level(level).map(|severity| (level_name(level), severity))
        }
        _ => None,
    }
}

/// Upper-case level names as the programming tool prints them.
fn level_name(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARNING",
        log::Level::Info => "INFO",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

/// Tag the part before the first colon, keep the rest plain on the same row.
fn enqueue_split(queue: &OutputQueue, formatted: &str, severity: Severity) {
    match formatted.split_once(':') {
        Some((head, rest)) => {
            queue.enqueue_with(head, severity, "");
            queue.enqueue(format!(":{rest}"), Severity::Plain);
        }
        None => queue.enqueue(formatted, severity),
    }
}

/// Process logger: `env_logger` for everything, plus the flash bridge.
pub struct BridgeLogger {
    inner: env_logger::Logger,
    bridge: &'static LogBridge,
}

impl BridgeLogger {
    pub fn new(inner: env_logger::Logger, bridge: &'static LogBridge) -> Self {
        Self { inner, bridge }
    }

    /// Install as the global logger. Bridged records are let through the
    /// max level even when `RUST_LOG` is stricter.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.inner.filter().max(log::LevelFilter::Info);
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata) || LogBridge::accepts(metadata)
    }

    fn log(&self, record: &log::Record) {
        self.bridge.forward(record);
        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::OutputSink;
    use std::{io::Write, sync::Arc};

    /// `env_logger` pipe target that keeps what was written.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Logger whose `env_logger` half only lets errors through.
    fn strict_logger(bridge: &'static LogBridge) -> (BridgeLogger, Captured) {
        let captured = Captured::default();
        let inner = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .format(|buf, record| writeln!(buf, "{} {}", record.level(), record.args()))
            .target(env_logger::Target::Pipe(Box::new(captured.clone())))
            .build();
        (BridgeLogger::new(inner, bridge), captured)
    }

    fn emit(logger: &dyn Log, level: log::Level, target: &str, message: &str) {
        logger.log(
            &log::Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{message}"))
                .build(),
        );
    }

    fn metadata(level: log::Level, target: &str) -> log::Metadata<'_> {
        log::Metadata::builder().level(level).target(target).build()
    }

    fn forward(bridge: &LogBridge, level: log::Level, target: &str, message: &str) -> bool {
        bridge.forward(
            &log::Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{message}"))
                .build(),
        )
    }

    #[test]
    fn flash_records_are_split_at_the_first_colon() {
        let bridge = LogBridge::new();
        let mut sink = OutputSink::new();
        bridge.attach(sink.queue());

        assert!(forward(&bridge, log::Level::Error, FLASH_LOG_TARGET, "UPDI: no ack"));
        sink.drain();

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "ERROR");
        assert_eq!(lines[0].severity, Severity::Error);
        assert_eq!(lines[0].terminator, "");
        assert_eq!(lines[1].text, ": UPDI: no ack");
        assert_eq!(lines[1].severity, Severity::Plain);
        assert_eq!(sink.text(), "ERROR: UPDI: no ack\n");
    }

    #[test]
    fn warning_uses_the_long_level_name() {
        let bridge = LogBridge::new();
        let mut sink = OutputSink::new();
        bridge.attach(sink.queue());

        forward(&bridge, log::Level::Warn, FLASH_LOG_TARGET, "slow target");
        sink.drain();
        assert_eq!(sink.lines()[0].text, "WARNING");
        assert_eq!(sink.lines()[0].severity, Severity::Warning);
    }

    #[test]
    fn other_targets_and_debug_are_ignored() {
        let bridge = LogBridge::new();
        let mut sink = OutputSink::new();
        bridge.attach(sink.queue());

        assert!(!forward(&bridge, log::Level::Error, "probe_bench::gui", "x"));
        assert!(!forward(&bridge, log::Level::Debug, FLASH_LOG_TARGET, "x"));
        assert!(!forward(&bridge, log::Level::Trace, FLASH_LOG_TARGET, "x"));
        assert_eq!(sink.drain(), 0);
    }

    #[test]
    fn detached_bridge_drops_records() {
        let bridge = LogBridge::new();
        let mut sink = OutputSink::new();
        bridge.attach(sink.queue());
        bridge.detach();

        assert!(!bridge.is_attached());
        assert!(!forward(&bridge, log::Level::Info, FLASH_LOG_TARGET, "x"));
        assert_eq!(sink.drain(), 0);
    }

    #[test]
    fn critical_records_keep_their_own_tag() {
        let bridge = LogBridge::new();
        let mut sink = OutputSink::new();
        bridge.attach(sink.queue());

        assert!(forward(&bridge, log::Level::Error, FLASH_CRITICAL_LOG_TARGET, "UPDI link lost"));
        sink.drain();

        assert_eq!(sink.lines()[0].text, "CRITICAL");
        assert_eq!(sink.lines()[0].severity, Severity::Critical);
        assert_eq!(sink.text(), "CRITICAL: UPDI link lost\n");
    }

    #[test]
    fn bridged_info_passes_a_stricter_process_filter() {
        let bridge: &'static LogBridge = Box::leak(Box::new(LogBridge::new()));
        let mut sink = OutputSink::new();
        bridge.attach(sink.queue());
        let (logger, captured) = strict_logger(bridge);

        assert!(logger.enabled(&metadata(log::Level::Info, FLASH_LOG_TARGET)));
        assert!(!logger.enabled(&metadata(log::Level::Info, "probe_bench::gui")));

        emit(&logger, log::Level::Info, FLASH_LOG_TARGET, "Pinging device...");
        logger.flush();

        sink.drain();
        assert_eq!(sink.text(), "INFO: Pinging device...\n");
        assert_eq!(captured.text(), "");
    }

    #[test]
    fn every_record_still_reaches_env_logger() {
        let bridge: &'static LogBridge = Box::leak(Box::new(LogBridge::new()));
        let mut sink = OutputSink::new();
        bridge.attach(sink.queue());
        let (logger, captured) = strict_logger(bridge);

        emit(&logger, log::Level::Error, FLASH_LOG_TARGET, "UPDI: no ack");
        emit(&logger, log::Level::Error, "probe_bench::gui", "window lost");
        logger.flush();

        sink.drain();
        assert_eq!(sink.text(), "ERROR: UPDI: no ack\n");
        assert_eq!(captured.text(), "ERROR UPDI: no ack\nERROR window lost\n");
    }
}
