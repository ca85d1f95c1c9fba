use anyhow::Result;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

use crate::core::{
    logs::{BridgeLogger, LogBridge},
    Bench, BenchConfig,
};

/// Environment variable naming a file that receives the process log.
pub const LOG_FILE_ENV: &str = "PROBE_BENCH_LOG_FILE";

/// Install the process logger: `env_logger` formatting plus the flash pane
/// bridge. Logs go to the file named by [`LOG_FILE_ENV`] when set, otherwise
/// to stderr.
pub fn init_common() {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_default_env();

    let log_file = std::env::var(LOG_FILE_ENV).ok();
    if let Some(path) = &log_file {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(err) => eprintln!("Failed to open log file '{path}': {err}"),
        }
    }

    if let Err(err) = BridgeLogger::new(builder.build(), LogBridge::global()).install() {
        eprintln!("Failed to install logger: {err}");
        return;
    }

    if let Some(path) = log_file {
        log::info!("logging to {path}");
    }
}

/// Build the hardware-backed bench and route programmer logs into its flash
/// pane.
pub fn build_bench(config: BenchConfig) -> Bench {
    let bench = Bench::with_hardware(config);
    bench.attach_log_bridge(LogBridge::global());
    bench
}

pub fn start_gui(config: BenchConfig) -> Result<()> {
    crate::gui::start(build_bench(config))
}

pub fn start_tui(config: BenchConfig) -> Result<()> {
    crate::tui::start(build_bench(config))
}
