pub mod modbus;
pub mod programmer;
