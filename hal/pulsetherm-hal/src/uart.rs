//! Serial bus abstractions
//!
//! The sensor bus is half duplex: the controller transmits a request, the
//! transceiver turns around, and the slave answers within a bounded time.
//! Implementations own direction control (DE/RE) if the transceiver needs it.

/// Half-duplex request/response serial bus
///
/// All operations are blocking but bounded. `read_available` must never
/// wait for more bytes than are already buffered.
pub trait SerialBus {
    /// Error type for bus operations
    type Error;

    /// Drop any stale bytes waiting in the receive buffer
    fn discard_input(&mut self) -> Result<(), Self::Error>;

    /// Write the entire buffer to the bus
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until the transmitter has shifted out every byte
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Copy already-received bytes into `buf`
    ///
    /// Returns the number of bytes copied, which may be zero.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartConfig {
    /// Sensor bus defaults (9600 8N1)
    pub const fn sensor_bus() -> Self {
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::sensor_bus()
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
