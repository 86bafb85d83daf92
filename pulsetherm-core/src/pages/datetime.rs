//! Calendar time formatting

use core::fmt::Write;

use crate::traits::DisplayLine;

/// Local time offset used by deployed devices (UTC+7)
pub const DEFAULT_UTC_OFFSET_S: i32 = 7 * 3600;

/// Broken-down calendar time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilTime {
    /// Convert seconds since the Unix epoch to a calendar date and time
    pub fn from_unix(secs: i64) -> Self {
        let days = secs.div_euclid(86_400);
        let of_day = secs.rem_euclid(86_400);

        // Proleptic Gregorian calendar in 400-year eras starting 0000-03-01
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z.rem_euclid(146_097);
        let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = doy - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };

        Self {
            year: year as i32,
            month: month as u8,
            day: day as u8,
            hour: (of_day / 3_600) as u8,
            minute: (of_day % 3_600 / 60) as u8,
            second: (of_day % 60) as u8,
        }
    }
}

/// Format `MM-DD HH:MM:SS` in local time, or a placeholder without a clock
pub fn format_datetime(unix_time: Option<u32>, utc_offset_s: i32) -> DisplayLine {
    let mut line = DisplayLine::new();
    match unix_time {
        Some(secs) => {
            let t = CivilTime::from_unix(secs as i64 + utc_offset_s as i64);
            let _ = write!(
                line,
                "{:02}-{:02} {:02}:{:02}:{:02}",
                t.month, t.day, t.hour, t.minute, t.second
            );
        }
        None => {
            let _ = line.push_str("--:--:--");
        }
    }
    line
}
