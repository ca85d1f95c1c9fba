use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

use probe_bench::{core::registry::format_port, utils::enumerate_ports, BenchConfig};

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "windows", target_os = "macos"))] {
        fn has_desktop_env() -> bool {
            true
        }
    } else if #[cfg(target_os = "linux")] {
        /// A desktop session exports DISPLAY or WAYLAND_DISPLAY.
        fn has_desktop_env() -> bool {
            std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
        }
    } else {
        fn has_desktop_env() -> bool {
            false
        }
    }
}

fn list_ports(json: bool) -> Result<()> {
    let ports = enumerate_ports();
    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
    } else if ports.is_empty() {
        println!("No serial ports found");
    } else {
        for port in &ports {
            println!("{}", format_port(port));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = Command::new("probe-bench")
        .about("Flash probe firmware and run its Modbus functional test")
        .arg(
            Arg::new("gui")
                .long("gui")
                .short('g')
                .help("Force GUI mode")
                .action(ArgAction::SetTrue)
                .conflicts_with("tui"),
        )
        .arg(
            Arg::new("tui")
                .long("tui")
                .short('t')
                .help("Force TUI mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("TOML file with flash, probe and ui settings")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .help("Print available serial ports and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the port list as JSON")
                .requires("list-ports")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    probe_bench::init_common();

    if matches.get_flag("list-ports") {
        return list_ports(matches.get_flag("json"));
    }

    let config = BenchConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    if matches.get_flag("gui") {
        log::info!("Forced GUI mode by argument");
        probe_bench::start_gui(config)
    } else if matches.get_flag("tui") {
        log::info!("Forced TUI mode by argument");
        probe_bench::start_tui(config)
    } else if has_desktop_env() {
        log::info!("Desktop environment detected, launching GUI mode");
        probe_bench::start_gui(config)
    } else {
        log::info!("No desktop environment detected, launching TUI mode");
        probe_bench::start_tui(config)
    }
}
