//! Modbus RTU protocol client

use embedded_hal::delay::DelayNs;

use pulsetherm_hal::SerialBus;
use pulsetherm_protocol::modbus::{ProtocolError, ReadRequest, MAX_RESPONSE_LEN};

use super::reading::SensorReading;
use crate::traits::RegisterSensor;

/// Time the slave gets to answer before the receive buffer is read
pub const DEFAULT_SETTLE_MS: u32 = 120;

/// Register reader for a half-duplex serial bus
///
/// Each read clears stale input, sends one request, waits a fixed settle
/// time and then takes whatever has arrived. There is no partial-read
/// retry and no retry on failure: the caller's poll cadence is the retry.
pub struct ProtocolClient<B, D> {
    bus: B,
    delay: D,
    settle_ms: u32,
    buffer: [u8; MAX_RESPONSE_LEN],
}

impl<B: SerialBus, D: DelayNs> ProtocolClient<B, D> {
    /// Create a client with the default settle time
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            bus,
            delay,
            settle_ms: DEFAULT_SETTLE_MS,
            buffer: [0; MAX_RESPONSE_LEN],
        }
    }

    /// Override the settle time
    pub fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Perform one register read
    pub fn read(
        &mut self,
        request: &ReadRequest,
        now_ms: u32,
    ) -> Result<SensorReading, ProtocolError> {
        self.bus.discard_input().map_err(|_| ProtocolError::Bus)?;
        self.bus
            .write_all(&request.encode())
            .map_err(|_| ProtocolError::Bus)?;
        self.bus.flush().map_err(|_| ProtocolError::Bus)?;

        self.delay.delay_ms(self.settle_ms);

        let len = self
            .bus
            .read_available(&mut self.buffer)
            .map_err(|_| ProtocolError::Bus)?;
        let response = request.parse_response(&self.buffer[..len])?;

        Ok(SensorReading {
            raw_register: response.first_register(),
            timestamp_ms: now_ms,
        })
    }

    /// Give back the bus and delay
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }
}

impl<B: SerialBus, D: DelayNs> RegisterSensor for ProtocolClient<B, D> {
    fn read(&mut self, request: &ReadRequest, now_ms: u32) -> Result<SensorReading, ProtocolError> {
        ProtocolClient::read(self, request, now_ms)
    }
}
