//! Register sensor trait

use pulsetherm_protocol::modbus::{ProtocolError, ReadRequest};

use crate::acquisition::SensorReading;

/// A sensor read with one bounded request/response exchange
pub trait RegisterSensor {
    /// Read the registers named by `request`
    ///
    /// `now_ms` is recorded as the reading timestamp.
    fn read(&mut self, request: &ReadRequest, now_ms: u32) -> Result<SensorReading, ProtocolError>;
}
