//! Board pin map
//!
//! ```text
//! GPIO0  UART0 TX  -> RS-485 DI
//! GPIO1  UART0 RX  <- RS-485 RO
//! GPIO4  UART1 TX  -> bridge RX
//! GPIO5  UART1 RX  <- bridge TX
//! GPIO8  I2C0 SDA  <> LCD backpack
//! GPIO9  I2C0 SCL  -> LCD backpack
//! GPIO20 input     <- pulse sensor (rising edge, pull-down)
//! ```

use embassy_rp::peripherals::{
    DMA_CH0, FLASH, I2C0, PIN_0, PIN_1, PIN_20, PIN_4, PIN_5, PIN_8, PIN_9, UART0, UART1,
};
use embassy_rp::{Peri, Peripherals};

/// Bridge link baud rate (the sensor bus uses `UartConfig::sensor_bus()`)
pub const BRIDGE_BAUDRATE: u32 = 115_200;

/// LCD I2C clock
pub const LCD_I2C_FREQUENCY: u32 = 400_000;

/// Peripherals used by the firmware, by function
pub struct Board {
    pub sensor_uart: Peri<'static, UART0>,
    pub sensor_tx: Peri<'static, PIN_0>,
    pub sensor_rx: Peri<'static, PIN_1>,
    pub bridge_uart: Peri<'static, UART1>,
    pub bridge_tx: Peri<'static, PIN_4>,
    pub bridge_rx: Peri<'static, PIN_5>,
    pub lcd_i2c: Peri<'static, I2C0>,
    pub lcd_sda: Peri<'static, PIN_8>,
    pub lcd_scl: Peri<'static, PIN_9>,
    pub pulse: Peri<'static, PIN_20>,
    pub flash: Peri<'static, FLASH>,
    pub flash_dma: Peri<'static, DMA_CH0>,
}

impl Board {
    pub fn new(p: Peripherals) -> Self {
        Self {
            sensor_uart: p.UART0,
            sensor_tx: p.PIN_0,
            sensor_rx: p.PIN_1,
            bridge_uart: p.UART1,
            bridge_tx: p.PIN_4,
            bridge_rx: p.PIN_5,
            lcd_i2c: p.I2C0,
            lcd_sda: p.PIN_8,
            lcd_scl: p.PIN_9,
            pulse: p.PIN_20,
            flash: p.FLASH,
            flash_dma: p.DMA_CH0,
        }
    }
}
