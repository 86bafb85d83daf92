//! CRC-16/MODBUS

/// Initial register value
pub const CRC_INIT: u16 = 0xFFFF;

/// Reflected generator polynomial (0x8005 bit-reversed)
pub const CRC_POLY: u16 = 0xA001;

/// Incremental CRC-16/MODBUS calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    /// Start a new checksum
    pub const fn new() -> Self {
        Self { value: CRC_INIT }
    }

    /// Fold a single byte into the checksum
    pub fn update_byte(&mut self, byte: u8) {
        self.value ^= byte as u16;
        for _ in 0..8 {
            if self.value & 0x0001 != 0 {
                self.value = (self.value >> 1) ^ CRC_POLY;
            } else {
                self.value >>= 1;
            }
        }
    }

    /// Fold a slice into the checksum
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.update_byte(byte);
        }
    }

    /// Current checksum value
    pub const fn finish(&self) -> u16 {
        self.value
    }
}

/// Compute the CRC-16/MODBUS of a byte slice
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(data);
    crc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_holding_register_vector() {
        // Read 1 holding register at 0 from slave 1: checksum bytes 84 0A
        let crc = crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(crc, 0x0A84);
        assert_eq!(crc.to_le_bytes(), [0x84, 0x0A]);
    }

    #[test]
    fn test_check_string() {
        // Catalogue check value for CRC-16/MODBUS
        assert_eq!(crc16(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_empty_is_init() {
        assert_eq!(crc16(&[]), CRC_INIT);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data = [0x11, 0x04, 0x00, 0x08, 0x00, 0x02, 0xFE];
        let mut crc = Crc16::new();
        crc.update(&data[..3]);
        crc.update_byte(data[3]);
        crc.update(&data[4..]);
        assert_eq!(crc.finish(), crc16(&data));
    }
}
