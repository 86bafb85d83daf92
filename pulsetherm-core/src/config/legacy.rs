//! Line-oriented record format of the previous firmware generation
//!
//! Each field sits on its own line in a fixed order. Missing trailing lines
//! keep their defaults and an unparsable numeric line falls back to that
//! field's default, so records written by older builds always load.
//!
//! Counters: `total`, `accumulated`, `divider`.
//!
//! Config: `mode`, `ssid`, `password`, `ip`, `gateway`, `subnet`,
//! `persist_divider`, `counting_enabled`, `acquisition_enabled`, `slave`,
//! `function`, `register`, `count`, `host`, `counter_path`, `temp_path`,
//! `upload_interval_ms`, `upload_divider`, `device_id`, `production_order_id`,
//! `scale_factor_percent`.

use core::fmt::Write;
use core::str::FromStr;

use heapless::String;

use super::types::{
    normalize_path, text, AcquisitionConfig, CountingConfig, DeviceConfig, NetworkMode,
    UploadConfig, UploadInterval, SCALE_FACTOR_RANGE,
};
use crate::counter::PulseCounters;

/// Largest encoded counter record
pub const LEGACY_COUNTERS_LEN: usize = 40;

/// Largest encoded config record
pub const LEGACY_CONFIG_LEN: usize = 640;

/// Number of lines in a complete config record
pub const CONFIG_FIELD_COUNT: usize = 21;

/// Decode a counter record
///
/// Parsing stops at the first malformed line; fields before it are kept.
pub fn parse_counters(record: &str) -> PulseCounters {
    let mut counters = PulseCounters::default();
    let mut lines = record.lines().map(str::trim);

    let fields: [&mut u32; 3] = [
        &mut counters.total,
        &mut counters.accumulated,
        &mut counters.divider,
    ];
    for field in fields {
        match lines.next().map(u32::from_str) {
            Some(Ok(value)) => *field = value,
            _ => break,
        }
    }

    counters
}

/// Encode a counter record
pub fn format_counters(counters: &PulseCounters) -> String<LEGACY_COUNTERS_LEN> {
    let mut out = String::new();
    let _ = write!(
        out,
        "{}\n{}\n{}\n",
        counters.total, counters.accumulated, counters.divider
    );
    out
}

fn number_or<T: FromStr>(line: &str, default: T) -> T {
    line.parse().unwrap_or(default)
}

fn text_or<const N: usize>(line: &str, default: &String<N>) -> String<N> {
    if line.is_empty() {
        default.clone()
    } else {
        text(line)
    }
}

/// Decode a config record
pub fn parse_config(record: &str) -> DeviceConfig {
    let mut config = DeviceConfig::default();
    let acq_default = AcquisitionConfig::default();
    let counting_default = CountingConfig::default();
    let upload_default = UploadConfig::default();

    for (index, line) in record.lines().map(str::trim).enumerate() {
        let net = &mut config.network;
        let acq = &mut config.acquisition;
        let counting = &mut config.counting;
        let upload = &mut config.upload;

        match index {
            0 => net.mode = NetworkMode::from_str_lossy(line),
            1 => net.ssid = text_or(line, &net.ssid),
            2 => net.password = text_or(line, &net.password),
            3 => net.static_ip = text(line),
            4 => net.gateway = text(line),
            5 => net.subnet_mask = text(line),
            6 => {
                counting.persist_divider =
                    number_or(line, counting_default.persist_divider).max(1)
            }
            7 => counting.enabled = line == "1",
            8 => acq.enabled = line == "1",
            9 => acq.slave_address = number_or(line, acq_default.slave_address),
            10 => acq.function_code = number_or(line, acq_default.function_code),
            11 => acq.register_address = number_or(line, acq_default.register_address),
            12 => acq.register_count = number_or(line, acq_default.register_count).max(1),
            13 => upload.host = text_or(line, &upload_default.host),
            14 => {
                upload.counter_path =
                    normalize_path(text_or(line, &upload_default.counter_path).as_str())
            }
            15 => {
                upload.temp_path =
                    normalize_path(text_or(line, &upload_default.temp_path).as_str())
            }
            16 => {
                upload.interval = line
                    .parse()
                    .ok()
                    .and_then(UploadInterval::from_ms)
                    .unwrap_or_default()
            }
            17 => {
                counting.upload_divider =
                    number_or(line, counting_default.upload_divider).max(1)
            }
            18 => upload.device_id = text_or(line, &upload_default.device_id),
            19 => {
                upload.production_order_id = text_or(line, &upload_default.production_order_id)
            }
            20 => {
                let k = number_or(line, acq_default.scale_factor_percent);
                acq.scale_factor_percent = if SCALE_FACTOR_RANGE.contains(&k) {
                    k
                } else {
                    acq_default.scale_factor_percent
                };
            }
            _ => break,
        }
    }

    config
}

/// Encode a config record
pub fn format_config(config: &DeviceConfig) -> String<LEGACY_CONFIG_LEN> {
    let net = &config.network;
    let acq = &config.acquisition;
    let counting = &config.counting;
    let upload = &config.upload;

    let mut out = String::new();
    let _ = writeln!(out, "{}", net.mode.as_str());
    let _ = writeln!(out, "{}", net.ssid);
    let _ = writeln!(out, "{}", net.password);
    let _ = writeln!(out, "{}", net.static_ip);
    let _ = writeln!(out, "{}", net.gateway);
    let _ = writeln!(out, "{}", net.subnet_mask);
    let _ = writeln!(out, "{}", counting.persist_divider);
    let _ = writeln!(out, "{}", counting.enabled as u8);
    let _ = writeln!(out, "{}", acq.enabled as u8);
    let _ = writeln!(out, "{}", acq.slave_address);
    let _ = writeln!(out, "{}", acq.function_code);
    let _ = writeln!(out, "{}", acq.register_address);
    let _ = writeln!(out, "{}", acq.register_count);
    let _ = writeln!(out, "{}", upload.host);
    let _ = writeln!(out, "{}", upload.counter_path);
    let _ = writeln!(out, "{}", upload.temp_path);
    let _ = writeln!(out, "{}", upload.interval.as_ms());
    let _ = writeln!(out, "{}", counting.upload_divider);
    let _ = writeln!(out, "{}", upload.device_id);
    let _ = writeln!(out, "{}", upload.production_order_id);
    let _ = writeln!(out, "{}", acq.scale_factor_percent);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RECORD: &str = "static\nplant-ap\nsecret\n10.0.0.20\n10.0.0.1\n255.255.255.0\n\
        20\n0\n1\n3\n4\n256\n2\ncollector.example\nctr%2Fpost.php\ntemp%252Fpost.php\n\
        120000\n5\ndev-7\nPO-123\n110\n";

    #[test]
    fn test_parse_counters() {
        let counters = parse_counters("1234\n98765\n7\n");
        assert_eq!(counters.total, 1234);
        assert_eq!(counters.accumulated, 98765);
        assert_eq!(counters.divider, 7);
    }

    #[test]
    fn test_parse_counters_stops_at_bad_line() {
        let counters = parse_counters("42\nnot-a-number\n3\n");
        assert_eq!(counters.total, 42);
        assert_eq!(counters.accumulated, 0);
        assert_eq!(counters.divider, 0);
    }

    #[test]
    fn test_parse_counters_missing_lines() {
        assert_eq!(parse_counters("").total, 0);
        let counters = parse_counters("5");
        assert_eq!(counters.total, 5);
        assert_eq!(counters.accumulated, 0);
    }

    #[test]
    fn test_format_counters() {
        let counters = PulseCounters {
            total: 1,
            accumulated: 22,
            divider: 3,
        };
        assert_eq!(format_counters(&counters).as_str(), "1\n22\n3\n");
        assert_eq!(parse_counters(&format_counters(&counters)), counters);
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL_RECORD);

        assert_eq!(config.network.mode, NetworkMode::Static);
        assert_eq!(config.network.ssid.as_str(), "plant-ap");
        assert_eq!(config.network.password.as_str(), "secret");
        assert_eq!(config.network.static_ip.as_str(), "10.0.0.20");
        assert_eq!(config.network.gateway.as_str(), "10.0.0.1");
        assert_eq!(config.network.subnet_mask.as_str(), "255.255.255.0");
        assert_eq!(config.counting.persist_divider, 20);
        assert!(!config.counting.enabled);
        assert!(config.acquisition.enabled);
        assert_eq!(config.acquisition.slave_address, 3);
        assert_eq!(config.acquisition.function_code, 4);
        assert_eq!(config.acquisition.register_address, 256);
        assert_eq!(config.acquisition.register_count, 2);
        assert_eq!(config.upload.host.as_str(), "collector.example");
        assert_eq!(config.upload.counter_path.as_str(), "ctr/post.php");
        assert_eq!(config.upload.temp_path.as_str(), "temp/post.php");
        assert_eq!(config.upload.interval, UploadInterval::TwoMinutes);
        assert_eq!(config.counting.upload_divider, 5);
        assert_eq!(config.upload.device_id.as_str(), "dev-7");
        assert_eq!(config.upload.production_order_id.as_str(), "PO-123");
        assert_eq!(config.acquisition.scale_factor_percent, 110);
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let config = parse_config("dhcp\nap\npw\n\n\n\nabc\n1\n");
        let defaults = DeviceConfig::default();

        assert_eq!(config.network.ssid.as_str(), "ap");
        assert_eq!(config.counting.persist_divider, 10);
        assert!(config.counting.enabled);
        // Line 9 onward missing
        assert_eq!(config.acquisition, defaults.acquisition);
        assert_eq!(config.upload, defaults.upload);
    }

    #[test]
    fn test_parse_config_blank_strings_fall_back() {
        let mut record: String<LEGACY_CONFIG_LEN> = String::new();
        for _ in 0..CONFIG_FIELD_COUNT {
            let _ = record.push('\n');
        }
        let config = parse_config(&record);
        let defaults = DeviceConfig::default();

        assert_eq!(config.upload.host, defaults.upload.host);
        assert_eq!(config.upload.device_id, defaults.upload.device_id);
        // Blank booleans read as disabled
        assert!(!config.counting.enabled);
        assert!(!config.acquisition.enabled);
    }

    #[test]
    fn test_config_record_roundtrip() {
        let config = parse_config(FULL_RECORD);
        let encoded = format_config(&config);
        assert_eq!(encoded.lines().count(), CONFIG_FIELD_COUNT);
        assert_eq!(parse_config(&encoded), config);
    }

    #[test]
    fn test_out_of_range_scale_factor() {
        let mut record: String<LEGACY_CONFIG_LEN> = String::new();
        for _ in 0..20 {
            let _ = record.push('\n');
        }
        let _ = record.push_str("400\n");
        assert_eq!(parse_config(&record).acquisition.scale_factor_percent, 100);
    }
}
