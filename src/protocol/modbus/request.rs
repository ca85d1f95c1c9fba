use rmodbus::{client::ModbusRequest, ModbusProto};

use super::ProbeError;

fn protocol_error(err: rmodbus::ErrorKind) -> ProbeError {
    ProbeError::Protocol(err.to_string())
}

/// Build a "write single coil" frame for the command coil.
pub fn generate_set_command_request(
    station_id: u8,
    coil: u16,
    start: bool,
) -> Result<(ModbusRequest, Vec<u8>), ProbeError> {
    let mut request = ModbusRequest::new(station_id, ModbusProto::Rtu);
    let mut raw = Vec::new();
    request
        .generate_set_coil(coil, start, &mut raw)
        .map_err(protocol_error)?;
    Ok((request, raw))
}

pub fn parse_set_command(request: &ModbusRequest, response: &[u8]) -> Result<(), ProbeError> {
    request.parse_ok(response).map_err(protocol_error)
}

/// Build a "read holding registers" frame for the single state register.
pub fn generate_get_state_request(
    station_id: u8,
    register: u16,
) -> Result<(ModbusRequest, Vec<u8>), ProbeError> {
    let mut request = ModbusRequest::new(station_id, ModbusProto::Rtu);
    let mut raw = Vec::new();
    request
        .generate_get_holdings(register, 1, &mut raw)
        .map_err(protocol_error)?;
    Ok((request, raw))
}

pub fn parse_get_state(request: &ModbusRequest, response: &[u8]) -> Result<u16, ProbeError> {
    let mut values: Vec<u16> = Vec::new();
    request
        .parse_u16(response, &mut values)
        .map_err(protocol_error)?;
    values
        .first()
        .copied()
        .ok_or_else(|| ProbeError::Protocol("empty register response".to_string()))
}
