//! Sensor acquisition over the RS-485 bus
//!
//! [`ProtocolClient`] performs one bounded Modbus register read per call and
//! converts the first register into a [`SensorReading`].

mod client;
mod reading;

pub use client::{ProtocolClient, DEFAULT_SETTLE_MS};
pub use reading::{scale_tenths, SensorReading, Tenths};
