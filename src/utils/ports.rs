use serde::Serialize;
use serialport::SerialPortType;

/// One enumerated serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    pub name: String,
    pub description: String,
}

/// Human-readable description of a port, as shown in the port selectors.
pub fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => [&info.product, &info.manufacturer]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| "n/a".to_string()),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    }
}

/// Return the available ports sorted by name.
///
/// Enumeration failures are logged and reported as an empty list; the next
/// refresh simply tries again.
pub fn enumerate_ports() -> Vec<PortEntry> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            log::warn!("serial port enumeration failed: {err}");
            return Vec::new();
        }
    };

    let mut entries: Vec<PortEntry> = ports
        .into_iter()
        .map(|port| PortEntry {
            description: describe_port_type(&port.port_type),
            name: port.port_name,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
