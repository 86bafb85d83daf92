//! Sensor serial bus on an RP2040 UART
//!
//! The bus runs on a buffered (interrupt-driven) UART so bytes arriving
//! while the scheduler waits out the settle time are kept in the ring
//! buffer. `read_available` only drains what `ReadReady` reports, so it
//! never blocks waiting for a slow or absent slave.

use embassy_rp::uart::{BufferedUart, Config, DataBits, Parity, StopBits};
use embedded_io::{Read, ReadReady, Write};

use pulsetherm_hal::uart::{self, SerialBus, UartConfig};

/// UART peripheral configuration for a sensor bus setting
pub fn embassy_config(config: &UartConfig) -> Config {
    let mut out = Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        uart::DataBits::Seven => DataBits::DataBits7,
        uart::DataBits::Eight => DataBits::DataBits8,
    };
    out.parity = match config.parity {
        uart::Parity::None => Parity::ParityNone,
        uart::Parity::Even => Parity::ParityEven,
        uart::Parity::Odd => Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        uart::StopBits::One => StopBits::STOP1,
        uart::StopBits::Two => StopBits::STOP2,
    };
    out
}

/// RS-485 sensor bus
///
/// The transceiver is expected to switch direction on its own (auto-DE
/// modules), as on the reference board.
pub struct Rp2040SerialBus {
    uart: BufferedUart,
}

impl Rp2040SerialBus {
    pub fn new(uart: BufferedUart) -> Self {
        Self { uart }
    }
}

impl SerialBus for Rp2040SerialBus {
    type Error = embassy_rp::uart::Error;

    fn discard_input(&mut self) -> Result<(), Self::Error> {
        let mut scratch = [0u8; 32];
        while self.uart.read_ready()? {
            self.uart.read(&mut scratch)?;
        }
        Ok(())
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        Write::write_all(&mut self.uart, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.uart)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut len = 0;
        while len < buf.len() && self.uart.read_ready()? {
            len += self.uart.read(&mut buf[len..])?;
        }
        Ok(len)
    }
}
