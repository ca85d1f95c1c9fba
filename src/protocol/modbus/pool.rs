use parking_lot::Mutex;
use std::sync::Arc;

use super::{Connector, ProbeError, ProbeLink};

pub type SharedLink = Arc<Mutex<Box<dyn ProbeLink>>>;

/// Process-wide cache of the probe link, keyed by port name.
///
/// Holds at most one link. Asking for the cached port returns the same link;
/// asking for another port opens a new one and evicts the old entry. Callers
/// keep their `Arc` for the whole run, so an eviction never closes a port
/// that is still in use; the port closes when its last user drops it.
///
/// One test at a time is the supported configuration. Two concurrent tests
/// on different ports stay correct but keep reopening their ports.
pub struct ConnectionPool {
    connector: Box<dyn Connector>,
    slot: Mutex<Option<(String, SharedLink)>>,
}

impl ConnectionPool {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_create(&self, port: &str) -> Result<SharedLink, ProbeError> {
        let mut slot = self.slot.lock();
        if let Some((cached_port, link)) = slot.as_ref() {
            if cached_port == port {
                log::debug!("reusing probe link on {port}");
                return Ok(link.clone());
            }
        }

        // The slot lock is held while connecting so two callers never open
        // the same port twice.
        let link: SharedLink = Arc::new(Mutex::new(self.connector.connect(port)?));
        *slot = Some((port.to_string(), link.clone()));
        Ok(link)
    }

    /// Drop the cached link for `port`, if it is the cached one.
    pub fn invalidate(&self, port: &str) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|(cached, _)| cached == port) {
            log::info!("dropping cached probe link on {port}");
            *slot = None;
        }
    }

    pub fn cached_port(&self) -> Option<String> {
        self.slot.lock().as_ref().map(|(port, _)| port.clone())
    }
}
