//! Status display pages
//!
//! The display rotates through three pages of two 16-column lines:
//!
//! ```text
//! Temperature     Counter            Connectivity
//! ┌────────────────┐ ┌────────────────┐ ┌────────────────┐
//! │10-14 03:00:00  │ │Q:  42 CPM:  30 │ │IP 192.168.1.50 │
//! │  27.1 C        │ │Accm:  1234     │ │RSSI: -61 dBm   │
//! └────────────────┘ └────────────────┘ └────────────────┘
//! ```

pub mod datetime;

use core::fmt::{self, Write};

use heapless::String;

use crate::acquisition::Tenths;
use crate::counter::PulseSnapshot;
use crate::scheduler::AcquisitionStatus;
use crate::traits::{Connectivity, DisplayLine, LINE_WIDTH};

pub use datetime::{format_datetime, CivilTime, DEFAULT_UTC_OFFSET_S};

/// Characters of an error description shown after `Err:`
const ERROR_TEXT_LEN: usize = 10;

/// Display page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    #[default]
    Temperature,
    Counter,
    Connectivity,
}

impl Page {
    /// Page shown after this one
    pub const fn next(self) -> Self {
        match self {
            Page::Temperature => Page::Counter,
            Page::Counter => Page::Connectivity,
            Page::Connectivity => Page::Temperature,
        }
    }

    /// Page index (0-2)
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// Everything the pages show
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub acquisition: &'a AcquisitionStatus,
    /// Last successful scaled reading, kept through failed polls
    pub last_value_x10: Option<u32>,
    /// The temperature page shows the outcome of a poll that just ran
    pub poll_result: bool,
    pub counting_enabled: bool,
    pub pulses: &'a PulseSnapshot,
    pub connectivity: &'a Connectivity,
    /// Wall time of the last poll attempt
    pub reading_time: Option<u32>,
    /// Current wall time
    pub now: Option<u32>,
    pub utc_offset_s: i32,
}

/// Format into a display line, cutting at the line width
fn line(args: fmt::Arguments<'_>) -> DisplayLine {
    let mut wide: String<{ LINE_WIDTH * 2 }> = String::new();
    let _ = wide.write_fmt(args);

    let mut out = DisplayLine::new();
    for c in wide.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Render both lines of a page
pub fn render(page: Page, ctx: &PageContext<'_>) -> [DisplayLine; 2] {
    match page {
        Page::Temperature => temperature_page(ctx),
        Page::Counter => counter_page(ctx),
        Page::Connectivity => connectivity_page(ctx),
    }
}

fn temperature_page(ctx: &PageContext<'_>) -> [DisplayLine; 2] {
    let when = format_datetime(ctx.reading_time.or(ctx.now), ctx.utc_offset_s);
    let detail = match ctx.acquisition {
        AcquisitionStatus::Disabled if ctx.poll_result => line(format_args!("RS485 disabled")),
        AcquisitionStatus::Disabled => DisplayLine::new(),
        AcquisitionStatus::Failed(e) if ctx.poll_result => {
            let text = e.as_str();
            let cut = text.len().min(ERROR_TEXT_LEN);
            line(format_args!("Err:{}", &text[..cut]))
        }
        _ => match ctx.last_value_x10 {
            Some(value_x10) => line(format_args!("{:>6} C", Tenths(value_x10))),
            None => line(format_args!("Temp N/A")),
        },
    };
    [when, detail]
}

fn counter_page(ctx: &PageContext<'_>) -> [DisplayLine; 2] {
    let first = line(format_args!(
        "Q:{:4} CPM:{:4}",
        ctx.pulses.total, ctx.pulses.display_rate
    ));
    let second = if ctx.counting_enabled {
        line(format_args!("Accm:{:6}", ctx.pulses.accumulated))
    } else {
        line(format_args!("Counter disabled"))
    };
    [first, second]
}

fn connectivity_page(ctx: &PageContext<'_>) -> [DisplayLine; 2] {
    let ip = ctx
        .connectivity
        .ip
        .as_ref()
        .map(|ip| ip.as_str())
        .unwrap_or("0.0.0.0");
    let first = line(format_args!("IP {}", ip));
    let second = match ctx.connectivity.rssi_dbm {
        Some(rssi) => line(format_args!("RSSI:{:4} dBm", rssi)),
        None => line(format_args!("RSSI: N/A")),
    };
    [first, second]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::text;
    use pulsetherm_protocol::ProtocolError;

    fn render_with(page: Page, acquisition: AcquisitionStatus) -> [DisplayLine; 2] {
        render_temperature(page, acquisition, acquisition.value_x10(), true)
    }

    fn render_temperature(
        page: Page,
        acquisition: AcquisitionStatus,
        last_value_x10: Option<u32>,
        poll_result: bool,
    ) -> [DisplayLine; 2] {
        let pulses = PulseSnapshot {
            total: 42,
            accumulated: 1234,
            display_rate: 30,
            ..Default::default()
        };
        let connectivity = Connectivity {
            ip: Some(text("192.168.1.50")),
            rssi_dbm: Some(-61),
        };
        let ctx = PageContext {
            acquisition: &acquisition,
            last_value_x10,
            poll_result,
            counting_enabled: true,
            pulses: &pulses,
            connectivity: &connectivity,
            reading_time: Some(1_791_921_600),
            now: Some(1_791_921_700),
            utc_offset_s: DEFAULT_UTC_OFFSET_S,
        };
        render(page, &ctx)
    }

    #[test]
    fn test_page_rotation() {
        assert_eq!(Page::Temperature.next(), Page::Counter);
        assert_eq!(Page::Counter.next(), Page::Connectivity);
        assert_eq!(Page::Connectivity.next(), Page::Temperature);
        assert_eq!(Page::Connectivity.index(), 2);
    }

    #[test]
    fn test_temperature_page() {
        let lines = render_with(Page::Temperature, AcquisitionStatus::Ok { value_x10: 271 });
        assert_eq!(lines[0].as_str(), "10-14 03:00:00");
        assert_eq!(lines[1].as_str(), "  27.1 C");
    }

    #[test]
    fn test_temperature_page_states() {
        let lines = render_with(
            Page::Temperature,
            AcquisitionStatus::Failed(ProtocolError::ChecksumMismatch),
        );
        assert_eq!(lines[1].as_str(), "Err:crc mismat");

        let lines = render_with(Page::Temperature, AcquisitionStatus::NotYetRead);
        assert_eq!(lines[1].as_str(), "Temp N/A");

        let lines = render_with(Page::Temperature, AcquisitionStatus::Disabled);
        assert_eq!(lines[1].as_str(), "RS485 disabled");
    }

    #[test]
    fn test_rotated_temperature_page_keeps_last_good_value() {
        let failed = AcquisitionStatus::Failed(ProtocolError::NoResponse);
        let lines = render_temperature(Page::Temperature, failed, Some(215), false);
        assert_eq!(lines[1].as_str(), "  21.5 C");

        let lines = render_temperature(Page::Temperature, failed, None, false);
        assert_eq!(lines[1].as_str(), "Temp N/A");

        // Only the date line while acquisition is off
        let lines = render_temperature(Page::Temperature, AcquisitionStatus::Disabled, None, false);
        assert_eq!(lines[0].as_str(), "10-14 03:00:00");
        assert_eq!(lines[1].as_str(), "");
    }

    #[test]
    fn test_counter_page() {
        let lines = render_with(Page::Counter, AcquisitionStatus::NotYetRead);
        assert_eq!(lines[0].as_str(), "Q:  42 CPM:  30");
        assert_eq!(lines[1].as_str(), "Accm:  1234");
    }

    #[test]
    fn test_counter_page_disabled_and_wide_values() {
        let pulses = PulseSnapshot {
            total: 123_456_789,
            display_rate: 12_345,
            ..Default::default()
        };
        let connectivity = Connectivity::default();
        let ctx = PageContext {
            acquisition: &AcquisitionStatus::NotYetRead,
            last_value_x10: None,
            poll_result: false,
            counting_enabled: false,
            pulses: &pulses,
            connectivity: &connectivity,
            reading_time: None,
            now: None,
            utc_offset_s: 0,
        };
        let lines = render(Page::Counter, &ctx);
        assert_eq!(lines[0].as_str(), "Q:123456789 CPM:");
        assert_eq!(lines[1].as_str(), "Counter disabled");

        let lines = render(Page::Temperature, &ctx);
        assert_eq!(lines[0].as_str(), "--:--:--");
    }

    #[test]
    fn test_connectivity_page() {
        let lines = render_with(Page::Connectivity, AcquisitionStatus::NotYetRead);
        assert_eq!(lines[0].as_str(), "IP 192.168.1.50");
        assert_eq!(lines[1].as_str(), "RSSI: -61 dBm");

        let connectivity = Connectivity::default();
        let ctx = PageContext {
            acquisition: &AcquisitionStatus::NotYetRead,
            last_value_x10: None,
            poll_result: false,
            counting_enabled: true,
            pulses: &PulseSnapshot::default(),
            connectivity: &connectivity,
            reading_time: None,
            now: None,
            utc_offset_s: 0,
        };
        let lines = render(Page::Connectivity, &ctx);
        assert_eq!(lines[0].as_str(), "IP 0.0.0.0");
        assert_eq!(lines[1].as_str(), "RSSI: N/A");
    }
}
