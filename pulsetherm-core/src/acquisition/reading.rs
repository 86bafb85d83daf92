//! Sensor reading values

use core::fmt;
use core::fmt::Write;

use heapless::String;

/// One successful sensor read
///
/// The transmitter reports tenths of a degree in its first register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// First register exactly as received
    pub raw_register: u16,
    /// Monotonic time of the read (ms)
    pub timestamp_ms: u32,
}

impl SensorReading {
    /// Reading value in tenths of a degree
    pub const fn value_x10(&self) -> u32 {
        self.raw_register as u32
    }

    /// Reading value in degrees
    pub fn celsius(&self) -> f32 {
        self.raw_register as f32 / 10.0
    }

    /// Value after applying a percent calibration factor
    pub fn scaled_x10(&self, scale_factor_percent: u16) -> u32 {
        scale_tenths(self.value_x10(), scale_factor_percent)
    }
}

/// Apply a percent factor to a tenths value, rounding half up
pub fn scale_tenths(value_x10: u32, scale_factor_percent: u16) -> u32 {
    let scaled = (value_x10 as u64 * scale_factor_percent as u64 + 50) / 100;
    scaled.min(u32::MAX as u64) as u32
}

/// Fixed-point tenths formatted as `whole.fraction`
///
/// Honors width and alignment, so `{:>6}` renders like `{:6.1}` on a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenths(pub u32);

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf: String<12> = String::new();
        write!(buf, "{}.{}", self.0 / 10, self.0 % 10).map_err(|_| fmt::Error)?;
        f.pad(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversion() {
        let reading = SensorReading {
            raw_register: 271,
            timestamp_ms: 0,
        };
        assert_eq!(reading.value_x10(), 271);
        assert!((reading.celsius() - 27.1).abs() < 1e-4);
    }

    #[test]
    fn test_scaling() {
        assert_eq!(scale_tenths(271, 100), 271);
        assert_eq!(scale_tenths(271, 50), 136);
        assert_eq!(scale_tenths(250, 103), 258);
        assert_eq!(scale_tenths(u16::MAX as u32, 200), 131_070);
        assert_eq!(scale_tenths(0, 150), 0);
    }

    #[test]
    fn test_tenths_display() {
        let mut s: String<16> = String::new();
        write!(s, "{:>6} C", Tenths(271)).unwrap();
        assert_eq!(s.as_str(), "  27.1 C");

        s.clear();
        write!(s, "{}", Tenths(5)).unwrap();
        assert_eq!(s.as_str(), "0.5");

        s.clear();
        write!(s, "{:>6}", Tenths(131_070)).unwrap();
        assert_eq!(s.as_str(), "13107.0");
    }
}
