//! 16x2 character LCD driver
//!
//! Driver for HD44780-compatible LCDs behind a PCF8574 I2C backpack.
//! The controller runs in 4-bit mode; every byte goes out as two nibbles,
//! each latched by pulsing the enable line.
//!
//! PCF8574 pin mapping:
//!
//! ```text
//! P7 P6 P5 P4 | P3        P2  P1  P0
//! D7 D6 D5 D4 | Backlight EN  RW  RS
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use pulsetherm_core::traits::{Display, DisplayError, LINE_WIDTH};

/// Backpack I2C address (0x27, or 0x3F on some boards)
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Number of display rows
const ROWS: u8 = 2;

/// PCF8574 control bits
mod pin {
    pub const RS: u8 = 0x01;
    pub const EN: u8 = 0x04;
    pub const BACKLIGHT: u8 = 0x08;
}

/// HD44780 commands
mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const ENTRY_MODE_INCREMENT: u8 = 0x06;
    pub const DISPLAY_ON_CURSOR_OFF: u8 = 0x0C;
    pub const FUNCTION_4BIT_2LINE: u8 = 0x28;
    pub const SET_DDRAM_ADDR: u8 = 0x80;
}

/// DDRAM address of the first column of each row
const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40];

/// HD44780 LCD over a PCF8574 backpack
pub struct Lcd1602<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    backlight: u8,
}

impl<I2C, D> Lcd1602<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a driver for the backpack at `address`
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            backlight: pin::BACKLIGHT,
        }
    }

    /// Run the power-on sequence and clear the screen
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.delay.delay_ms(50);

        // Force 8-bit mode three times, then switch to 4-bit
        for _ in 0..3 {
            self.write_nibble(0x30, 0)?;
            self.delay.delay_ms(5);
        }
        self.write_nibble(0x20, 0)?;
        self.delay.delay_ms(5);

        self.command(cmd::FUNCTION_4BIT_2LINE)?;
        self.command(cmd::DISPLAY_ON_CURSOR_OFF)?;
        self.command(cmd::ENTRY_MODE_INCREMENT)?;
        self.clear()
    }

    /// Clear the screen
    pub fn clear(&mut self) -> Result<(), DisplayError> {
        self.command(cmd::CLEAR)?;
        self.delay.delay_ms(5);
        Ok(())
    }

    /// Switch the backlight
    pub fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        self.backlight = if on { pin::BACKLIGHT } else { 0 };
        let state = [self.backlight];
        self.i2c
            .write(self.address, &state)
            .map_err(|e| bus_error(e.kind()))
    }

    /// Give back the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, command: u8) -> Result<(), DisplayError> {
        self.write_byte(command, 0)
    }

    fn write_byte(&mut self, value: u8, mode: u8) -> Result<(), DisplayError> {
        self.write_nibble(value & 0xF0, mode)?;
        self.write_nibble(value << 4, mode)
    }

    /// Put the high nibble of `bits` on D4-D7 and pulse enable
    fn write_nibble(&mut self, bits: u8, mode: u8) -> Result<(), DisplayError> {
        let data = mode | (bits & 0xF0) | self.backlight;
        self.i2c
            .write(self.address, &[data | pin::EN])
            .map_err(|e| bus_error(e.kind()))?;
        self.delay.delay_us(500);
        self.i2c
            .write(self.address, &[data])
            .map_err(|e| bus_error(e.kind()))?;
        self.delay.delay_us(100);
        Ok(())
    }
}

fn bus_error(kind: ErrorKind) -> DisplayError {
    match kind {
        ErrorKind::NoAcknowledge(_) => DisplayError::NotResponding,
        _ => DisplayError::Bus,
    }
}

/// The character ROM only covers ASCII reliably
fn glyph(c: char) -> u8 {
    if c.is_ascii() && !c.is_ascii_control() {
        c as u8
    } else {
        b'?'
    }
}

impl<I2C, D> Display for Lcd1602<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn write_line(&mut self, row: u8, text: &str) -> Result<(), DisplayError> {
        let offset = ROW_OFFSETS[row.min(ROWS - 1) as usize];
        self.command(cmd::SET_DDRAM_ADDR | offset)?;

        let mut chars = text.chars();
        for _ in 0..LINE_WIDTH {
            let c = chars.next().map(glyph).unwrap_or(b' ');
            self.write_byte(c, pin::RS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, Operation};
    use heapless::Vec;

    /// Records every byte written to the backpack
    struct MockI2c {
        writes: Vec<u8, 1024>,
        nack: bool,
    }

    impl MockI2c {
        fn new() -> Self {
            Self {
                writes: Vec::new(),
                nack: false,
            }
        }

        /// Reassemble the bytes the controller latched (RS flag, value)
        fn latched(&self) -> Vec<(bool, u8), 256> {
            let mut out = Vec::new();
            let nibbles: Vec<u8, 512> = self
                .writes
                .iter()
                .copied()
                .filter(|b| b & pin::EN != 0)
                .collect();
            for pair in nibbles.chunks(2) {
                if let [high, low] = pair {
                    let value = (high & 0xF0) | (low >> 4);
                    let _ = out.push((high & pin::RS != 0, value));
                }
            }
            out
        }
    }

    impl ErrorType for MockI2c {
        type Error = ErrorKind;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(address, DEFAULT_ADDRESS);
            if self.nack {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for op in operations {
                if let Operation::Write(bytes) = op {
                    for b in bytes.iter() {
                        let _ = self.writes.push(*b);
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn lcd() -> Lcd1602<MockI2c, NoDelay> {
        Lcd1602::new(MockI2c::new(), NoDelay, DEFAULT_ADDRESS)
    }

    #[test]
    fn test_init_sequence() {
        let mut lcd = lcd();
        lcd.init().unwrap();
        let (i2c, _) = lcd.release();

        // Five raw nibbles (3x 0x3, 0x2) before full bytes start
        let raw: Vec<u8, 16> = i2c
            .writes
            .iter()
            .copied()
            .filter(|b| b & pin::EN != 0)
            .take(4)
            .map(|b| b & 0xF0)
            .collect();
        assert_eq!(&raw[..], &[0x30, 0x30, 0x30, 0x20]);

        // Every write keeps the backlight on
        assert!(i2c.writes.iter().all(|b| b & pin::BACKLIGHT != 0));
    }

    #[test]
    fn test_write_line_pads() {
        let mut lcd = lcd();
        lcd.write_line(1, "Temp N/A").unwrap();
        let (i2c, _) = lcd.release();
        let latched = i2c.latched();

        assert_eq!(latched.len(), 1 + LINE_WIDTH);
        assert_eq!(latched[0], (false, 0xC0));
        let text: Vec<u8, 16> = latched[1..].iter().map(|(_, c)| *c).collect();
        assert_eq!(&text[..], b"Temp N/A        ");
        assert!(latched[1..].iter().all(|(rs, _)| *rs));
    }

    #[test]
    fn test_write_line_truncates_and_replaces() {
        let mut lcd = lcd();
        lcd.write_line(0, "25.0°C and a long tail").unwrap();
        let (i2c, _) = lcd.release();
        let latched = i2c.latched();

        assert_eq!(latched[0], (false, 0x80));
        let text: Vec<u8, 16> = latched[1..].iter().map(|(_, c)| *c).collect();
        assert_eq!(&text[..], b"25.0?C and a lon");
    }

    #[test]
    fn test_show_writes_both_rows() {
        let mut lcd = lcd();
        let lines = [
            pulsetherm_core::config::text("IP 10.0.0.7"),
            pulsetherm_core::config::text("RSSI: -55 dBm"),
        ];
        lcd.show(&lines).unwrap();
        let (i2c, _) = lcd.release();
        let latched = i2c.latched();

        assert_eq!(latched.len(), 2 * (1 + LINE_WIDTH));
        assert_eq!(latched[1 + LINE_WIDTH], (false, 0xC0));
    }

    #[test]
    fn test_missing_backpack() {
        let mut i2c = MockI2c::new();
        i2c.nack = true;
        let mut lcd = Lcd1602::new(i2c, NoDelay, DEFAULT_ADDRESS);
        assert_eq!(lcd.init(), Err(DisplayError::NotResponding));
    }

    #[test]
    fn test_backlight_off() {
        let mut lcd = lcd();
        lcd.set_backlight(false).unwrap();
        lcd.write_line(0, "").unwrap();
        let (i2c, _) = lcd.release();
        assert!(i2c.writes.iter().all(|b| b & pin::BACKLIGHT == 0));
    }
}
