use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    core::{
        config::BenchConfig,
        controller::{SubmitController, SubmitOutcome, TickOutcome},
        error::TaskKind,
        flash::{FlashArgs, FlashTask},
        logs::LogBridge,
        probe_test::{ProbeTestTask, TestArgs},
        registry::{PortRegistry, PortSelection},
    },
    protocol::{
        modbus::{ConnectionPool, Connector, RtuConnector},
        programmer::{Programmer, ProgrammerFactory, PymcuprogProgrammer},
    },
    utils::ports::{enumerate_ports, PortEntry},
};

/// What one pass of [`Bench::on_tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchTick {
    pub flash: TickOutcome,
    pub test: TickOutcome,
    pub ports_refreshed: bool,
}

impl BenchTick {
    /// Whether the frontend has something new to draw.
    pub fn changed(&self) -> bool {
        self.ports_refreshed
            || self.flash != TickOutcome::Idle
            || self.test != TickOutcome::Idle
    }
}

/// Everything both frontends render: the two panes, their port selections
/// and the shared collaborators.
pub struct Bench {
    config: BenchConfig,
    flash: SubmitController,
    test: SubmitController,
    flash_ports: PortSelection,
    test_ports: PortSelection,
    flash_image: Option<PathBuf>,
    registry: PortRegistry,
    pool: Arc<ConnectionPool>,
    programmer: ProgrammerFactory,
}

impl Bench {
    pub fn new(
        config: BenchConfig,
        connector: impl Connector + 'static,
        programmer: ProgrammerFactory,
        enumerate: impl Fn() -> Vec<PortEntry> + Send + 'static,
    ) -> Self {
        let poll_interval = config.ui.poll_interval();
        let registry = PortRegistry::new(config.ui.port_refresh(), enumerate);
        let ports = registry.ports().to_vec();

        let mut flash_ports = PortSelection::default();
        let mut test_ports = PortSelection::default();
        flash_ports.set_available(ports.clone());
        test_ports.set_available(ports.clone());
        if let Some(first) = ports.first() {
            flash_ports.select(first.clone());
        }
        if let Some(second) = ports.get(1) {
            test_ports.select(second.clone());
        }

        Self {
            config,
            flash: SubmitController::new(TaskKind::Flash, poll_interval),
            test: SubmitController::new(TaskKind::Test, poll_interval),
            flash_ports,
            test_ports,
            flash_image: None,
            registry,
            pool: Arc::new(ConnectionPool::new(connector)),
            programmer,
        }
    }

    /// Bench wired to the serial probe, the programming tool and the real
    /// port list.
    pub fn with_hardware(config: BenchConfig) -> Self {
        let connector = RtuConnector::new(config.probe.clone());
        let flash_config = config.flash.clone();
        let programmer: ProgrammerFactory = Arc::new(move || {
            Box::new(PymcuprogProgrammer::new(flash_config.clone())) as Box<dyn Programmer>
        });
        Self::new(config, connector, programmer, enumerate_ports)
    }

    /// Send bridged programmer log records into the flash pane.
    pub fn attach_log_bridge(&self, bridge: &LogBridge) {
        bridge.attach(self.flash.sink().queue());
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn flash(&self) -> &SubmitController {
        &self.flash
    }

    pub fn test(&self) -> &SubmitController {
        &self.test
    }

    pub fn flash_mut(&mut self) -> &mut SubmitController {
        &mut self.flash
    }

    pub fn test_mut(&mut self) -> &mut SubmitController {
        &mut self.test
    }

    pub fn flash_ports(&self) -> &PortSelection {
        &self.flash_ports
    }

    pub fn flash_ports_mut(&mut self) -> &mut PortSelection {
        &mut self.flash_ports
    }

    pub fn test_ports(&self) -> &PortSelection {
        &self.test_ports
    }

    pub fn test_ports_mut(&mut self) -> &mut PortSelection {
        &mut self.test_ports
    }

    pub fn flash_image(&self) -> Option<&Path> {
        self.flash_image.as_deref()
    }

    pub fn set_flash_image(&mut self, image: Option<PathBuf>) {
        self.flash_image = image;
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn submit_flash(&mut self) -> SubmitOutcome {
        let args = FlashArgs {
            image: self.flash_image.clone(),
            port: self.flash_ports.port().map(str::to_string),
        };
        let prepared = FlashTask::prepare(
            args,
            self.config.flash.device.clone(),
            self.programmer.clone(),
        );
        self.flash.submit(prepared)
    }

    pub fn submit_test(&mut self) -> SubmitOutcome {
        let args = TestArgs {
            port: self.test_ports.port().map(str::to_string),
        };
        let prepared = ProbeTestTask::prepare(args, self.pool.clone(), &self.config.probe);
        self.test.submit(prepared)
    }

    /// Run every timer that is due: both pane poll ticks and the port refresh.
    pub fn on_tick(&mut self, now: Instant) -> BenchTick {
        let flash = self.flash.poll(now);
        let test = self.test.poll(now);

        let ports_refreshed = self.registry.poll(now);
        if ports_refreshed {
            let ports = self.registry.ports().to_vec();
            self.flash_ports.set_available(ports.clone());
            self.test_ports.set_available(ports);
        }

        BenchTick {
            flash,
            test,
            ports_refreshed,
        }
    }

    /// How long the frontend may sleep before the next timer is due.
    pub fn next_wake(&self, now: Instant) -> Duration {
        [
            self.flash.next_wake(now),
            self.test.next_wake(now),
            self.registry.next_wake(now),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(self.config.ui.port_refresh())
    }
}
