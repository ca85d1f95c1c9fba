use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use probe_bench::{
    core::{
        config::ProbeConfig, OutputLine, Severity, SubmitOutcome, TickOutcome,
    },
    protocol::{
        modbus::{Connector, ProbeError, ProbeLink},
        programmer::{FlashError, Programmer, ProgrammerFactory},
    },
    utils::PortEntry,
    Bench, BenchConfig,
};

/// Programmer that blocks in `write_image` until released.
#[derive(Clone)]
struct GatedProgrammer {
    release: flume::Receiver<()>,
}

impl Programmer for GatedProgrammer {
    fn connect(&mut self, _port: &str) -> Result<(), FlashError> {
        Ok(())
    }

    fn start_session(&mut self, _device: &str) -> Result<(), FlashError> {
        Ok(())
    }

    fn read_device_id(&mut self) -> Result<String, FlashError> {
        Ok("1E9123".to_string())
    }

    fn erase_all(&mut self) -> Result<(), FlashError> {
        Ok(())
    }

    fn write_image(&mut self, _image: &Path) -> Result<(), FlashError> {
        self.release
            .recv()
            .map_err(|_| FlashError::Verify("gate dropped".to_string()))
    }

    fn verify_image(&mut self, _image: &Path) -> Result<(), FlashError> {
        Ok(())
    }
}

struct ReplayLink {
    states: Arc<Mutex<VecDeque<u16>>>,
}

impl ProbeLink for ReplayLink {
    fn port_name(&self) -> &str {
        "COM4"
    }

    fn write_command(&mut self, _start: bool) -> Result<(), ProbeError> {
        Ok(())
    }

    fn read_state(&mut self) -> Result<u16, ProbeError> {
        self.states
            .lock()
            .pop_front()
            .ok_or(ProbeError::Timeout(Duration::from_millis(50)))
    }
}

#[derive(Clone, Default)]
struct ReplayConnector {
    states: Arc<Mutex<VecDeque<u16>>>,
}

impl Connector for ReplayConnector {
    fn connect(&self, _port: &str) -> Result<Box<dyn ProbeLink>, ProbeError> {
        Ok(Box::new(ReplayLink {
            states: self.states.clone(),
        }))
    }
}

fn ports() -> Vec<PortEntry> {
    ["COM3", "COM4"]
        .iter()
        .map(|name| PortEntry {
            name: name.to_string(),
            description: "USB Serial".to_string(),
        })
        .collect()
}

fn config() -> BenchConfig {
    BenchConfig {
        probe: ProbeConfig {
            poll_interval_ms: 1,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn bench(connector: ReplayConnector, release: flume::Receiver<()>) -> Bench {
    let programmer: ProgrammerFactory = Arc::new(move || {
        Box::new(GatedProgrammer {
            release: release.clone(),
        }) as Box<dyn Programmer>
    });
    Bench::new(config(), connector, programmer, ports)
}

/// Drive the bench timers until `done` holds, as a frontend loop would.
fn drive(bench: &mut Bench, mut done: impl FnMut(&Bench) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        bench.on_tick(Instant::now());
        if done(bench) {
            return;
        }
        thread::sleep(bench.next_wake(Instant::now()).min(Duration::from_millis(10)));
    }
    panic!("bench did not reach the expected state");
}

fn texts(lines: &[OutputLine]) -> Vec<&str> {
    lines.iter().map(|line| line.text.as_str()).collect()
}

#[test]
fn flash_keeps_submit_disabled_until_the_outcome_line() {
    let (release_tx, release_rx) = flume::unbounded();
    let mut bench = bench(ReplayConnector::default(), release_rx);
    bench.set_flash_image(Some(PathBuf::from("build/foo.hex")));

    assert_eq!(bench.flash_ports().port(), Some("COM3"));
    assert_eq!(bench.submit_flash(), SubmitOutcome::Started);
    assert_eq!(bench.submit_flash(), SubmitOutcome::Busy);

    // Still blocked in the programmer: several ticks pass without an outcome.
    for _ in 0..5 {
        bench.on_tick(Instant::now() + Duration::from_secs(1));
        assert!(!bench.flash().is_submit_enabled());
        thread::sleep(Duration::from_millis(5));
    }
    assert!(bench.flash().sink().is_empty());

    release_tx.send(()).unwrap();
    drive(&mut bench, |bench| bench.flash().is_submit_enabled());

    let lines = bench.flash().sink().lines();
    assert_eq!(texts(lines), vec!["foo.hex flashed succesfully"]);
    assert_eq!(lines[0].severity, Severity::Success);
}

#[test]
fn functional_test_reports_each_transition_once() {
    let connector = ReplayConnector::default();
    connector.states.lock().extend([0, 0, 1, 1, 3]);
    let (_release_tx, release_rx) = flume::unbounded();
    let mut bench = bench(connector, release_rx);

    assert_eq!(bench.test_ports().port(), Some("COM4"));
    assert_eq!(bench.submit_test(), SubmitOutcome::Started);
    drive(&mut bench, |bench| bench.test().is_submit_enabled());

    let lines = bench.test().sink().lines();
    let stamps = lines
        .iter()
        .filter(|line| line.terminator == " " && line.text.starts_with('['))
        .count();
    assert_eq!(stamps, 3);
    assert_eq!(
        texts(lines)
            .into_iter()
            .filter(|text| !text.starts_with('['))
            .collect::<Vec<_>>(),
        vec!["Test initialization", "Test in progress", "Test success"]
    );

    // A finished pane reports idle on the next tick.
    let tick = bench.on_tick(Instant::now() + Duration::from_secs(1));
    assert_eq!(tick.test, TickOutcome::Idle);
}

#[test]
fn resubmitting_clears_the_previous_run() {
    let connector = ReplayConnector::default();
    connector.states.lock().extend([3]);
    let (_release_tx, release_rx) = flume::unbounded();
    let mut bench = bench(connector.clone(), release_rx);

    bench.submit_test();
    drive(&mut bench, |bench| bench.test().is_submit_enabled());
    assert!(!bench.test().sink().is_empty());

    bench.test_ports_mut().select("");
    assert_eq!(bench.submit_test(), SubmitOutcome::Rejected);
    assert_eq!(texts(bench.test().sink().lines()), vec!["Invalid test arguments"]);
}
