use std::time::{Duration, Instant};

use crate::{core::ticker::Ticker, utils::ports::PortEntry};

/// Format a port as shown in the selectors: `"<name> (<description>)"`.
pub fn format_port(entry: &PortEntry) -> String {
    format!("{} ({})", entry.name, entry.description)
}

/// Extract the port name from a selector value. Returns `None` when nothing
/// usable is selected.
pub fn parse_port(selection: &str) -> Option<&str> {
    let name = selection
        .split_once('(')
        .map_or(selection, |(name, _)| name)
        .trim();
    (!name.is_empty()).then_some(name)
}

/// Port chooser state of one pane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSelection {
    pub available: Vec<String>,
    pub selected: String,
}

impl PortSelection {
    /// Replace the choices. The selected value is left alone even if the port
    /// has disappeared.
    pub fn set_available(&mut self, available: Vec<String>) {
        self.available = available;
    }

    pub fn select(&mut self, value: impl Into<String>) {
        self.selected = value.into();
    }

    /// Port name of the current selection.
    pub fn port(&self) -> Option<&str> {
        parse_port(&self.selected)
    }

    /// Index of the selection within `available`, if it is listed.
    pub fn selected_index(&self) -> Option<usize> {
        self.available.iter().position(|item| *item == self.selected)
    }

    /// Move the selection by `step` within `available`, wrapping around.
    pub fn cycle(&mut self, step: isize) {
        if self.available.is_empty() {
            return;
        }
        let len = self.available.len() as isize;
        let next = match self.selected_index() {
            Some(index) => (index as isize + step).rem_euclid(len),
            None if step >= 0 => 0,
            None => len - 1,
        };
        self.selected = self.available[next as usize].clone();
    }
}

/// Periodic serial port enumeration.
pub struct PortRegistry {
    enumerate: Box<dyn Fn() -> Vec<PortEntry> + Send>,
    ports: Vec<String>,
    ticker: Ticker,
}

impl PortRegistry {
    /// Create the registry and run the first enumeration right away.
    pub fn new(
        refresh_interval: Duration,
        enumerate: impl Fn() -> Vec<PortEntry> + Send + 'static,
    ) -> Self {
        let mut registry = Self {
            enumerate: Box::new(enumerate),
            ports: Vec::new(),
            ticker: Ticker::new(refresh_interval),
        };
        registry.refresh(Instant::now());
        registry
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// Enumerate now and re-arm the timer. Returns `true` when the list
    /// changed.
    pub fn refresh(&mut self, now: Instant) -> bool {
        let ports: Vec<String> = (self.enumerate)().iter().map(format_port).collect();
        self.ticker.arm(now);
        if ports == self.ports {
            return false;
        }
        log::debug!("serial ports changed: {ports:?}");
        self.ports = ports;
        true
    }

    /// Refresh if the timer is due. Returns `true` when a refresh ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.ticker.fire(now) {
            self.refresh(now);
            true
        } else {
            false
        }
    }

    pub fn next_wake(&self, now: Instant) -> Option<Duration> {
        self.ticker.remaining(now)
    }
}
