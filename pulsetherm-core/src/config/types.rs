//! Device configuration type definitions

use heapless::String;
use serde::{Deserialize, Serialize};

/// Maximum Wi-Fi SSID length
pub const SSID_LEN: usize = 32;
/// Maximum Wi-Fi password length
pub const PASSWORD_LEN: usize = 64;
/// Dotted-quad IPv4 address text
pub const IP_LEN: usize = 15;
/// Maximum upload host length
pub const HOST_LEN: usize = 48;
/// Maximum upload path length
pub const PATH_LEN: usize = 48;
/// Maximum device or production order identifier length
pub const ID_LEN: usize = 32;

/// Smallest accepted poll interval
pub const MIN_POLL_INTERVAL_MS: u32 = 1_000;
/// Largest accepted poll interval
pub const MAX_POLL_INTERVAL_MS: u32 = 3_600_000;
/// Accepted temperature scale factor range (percent)
pub const SCALE_FACTOR_RANGE: core::ops::RangeInclusive<u16> = 50..=200;

/// How the network interface obtains its address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkMode {
    /// Address assigned by the access point
    #[default]
    Dhcp,
    /// Fixed address from `static_ip`/`gateway`/`subnet_mask`
    Static,
}

impl NetworkMode {
    /// Keyword used by the line-oriented config format
    pub const fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::Dhcp => "dhcp",
            NetworkMode::Static => "static",
        }
    }

    /// Parse a keyword; anything other than `static` means DHCP
    pub fn from_str_lossy(s: &str) -> Self {
        if s.trim() == "static" {
            NetworkMode::Static
        } else {
            NetworkMode::Dhcp
        }
    }
}

/// Network identity
///
/// Changes are persisted immediately but only take effect after a reset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkConfig {
    pub mode: NetworkMode,
    pub ssid: String<SSID_LEN>,
    pub password: String<PASSWORD_LEN>,
    pub static_ip: String<IP_LEN>,
    pub gateway: String<IP_LEN>,
    pub subnet_mask: String<IP_LEN>,
}

/// Pulse counting parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CountingConfig {
    /// Pulses between counter saves
    pub persist_divider: u32,
    /// Pulses between counter uploads
    pub upload_divider: u32,
    /// Whether pulses are counted at all
    pub enabled: bool,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            persist_divider: 10,
            upload_divider: 10,
            enabled: true,
        }
    }
}

/// Sensor bus polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    /// Whether the sensor is polled
    pub enabled: bool,
    /// Modbus slave address
    pub slave_address: u8,
    /// Modbus function code (0x03 holding, 0x04 input)
    pub function_code: u8,
    /// First register to read
    pub register_address: u16,
    /// Number of registers to read
    pub register_count: u16,
    /// Time between sensor polls
    pub poll_interval_ms: u32,
    /// Calibration factor applied to each reading (percent, 100 = unity)
    pub scale_factor_percent: u16,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slave_address: 1,
            function_code: 0x03,
            register_address: 0,
            register_count: 1,
            poll_interval_ms: 10_000,
            scale_factor_percent: 100,
        }
    }
}

/// Temperature upload cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadInterval {
    #[default]
    OneMinute,
    TwoMinutes,
    ThreeMinutes,
    FiveMinutes,
}

impl UploadInterval {
    /// Every selectable interval
    pub const ALL: [UploadInterval; 4] = [
        UploadInterval::OneMinute,
        UploadInterval::TwoMinutes,
        UploadInterval::ThreeMinutes,
        UploadInterval::FiveMinutes,
    ];

    /// Interval in milliseconds
    pub const fn as_ms(&self) -> u32 {
        match self {
            UploadInterval::OneMinute => 60_000,
            UploadInterval::TwoMinutes => 120_000,
            UploadInterval::ThreeMinutes => 180_000,
            UploadInterval::FiveMinutes => 300_000,
        }
    }

    /// Interval from milliseconds, if it is one of the selectable values
    pub fn from_ms(ms: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_ms() == ms)
    }
}

/// Remote collector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UploadConfig {
    pub host: String<HOST_LEN>,
    pub counter_path: String<PATH_LEN>,
    pub temp_path: String<PATH_LEN>,
    pub interval: UploadInterval,
    pub device_id: String<ID_LEN>,
    pub production_order_id: String<ID_LEN>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            host: text("137.184.86.182"),
            counter_path: text("iot2026/smart01/insert2C.php"),
            temp_path: text("iot2026/smart01/insertT.php"),
            interval: UploadInterval::OneMinute,
            device_id: text("smart01"),
            production_order_id: text("PO-001"),
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub network: NetworkConfig,
    pub counting: CountingConfig,
    pub acquisition: AcquisitionConfig,
    pub upload: UploadConfig,
}

/// Build a fixed-capacity string, truncating at a character boundary
pub fn text<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Replace URL-encoded slashes (`%2F`, double-encoded `%252F`) with `/`
pub fn normalize_path<const N: usize>(path: &str) -> String<N> {
    let mut out = String::new();
    let mut rest = path;
    while !rest.is_empty() {
        if let Some(tail) = strip_prefix_ignore_case(rest, "%252F") {
            let _ = out.push('/');
            rest = tail;
        } else if let Some(tail) = strip_prefix_ignore_case(rest, "%2F") {
            let _ = out.push('/');
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                if out.push(c).is_err() {
                    break;
                }
            }
            rest = chars.as_str();
        }
    }
    out
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}
