//! Settings snapshots and partial updates from the control plane
//!
//! Every field of an update is optional; `None` keeps the current value.
//! Out-of-range values are rejected individually and the remaining fields
//! are still applied, matching how the device's admin form behaves.

use heapless::String;
use serde::{Deserialize, Serialize};

use pulsetherm_protocol::modbus::{FUNC_READ_HOLDING, FUNC_READ_INPUT, MAX_REGISTER_COUNT};

use super::types::{
    normalize_path, DeviceConfig, NetworkMode, UploadInterval, HOST_LEN, ID_LEN, IP_LEN,
    MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS, PASSWORD_LEN, PATH_LEN, SCALE_FACTOR_RANGE,
    SSID_LEN,
};

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Divider must be at least 1
    InvalidDivider,
    /// Slave address outside 1-247
    InvalidSlaveAddress,
    /// Only read holding (0x03) and read input (0x04) are supported
    InvalidFunctionCode,
    /// Register count outside 1-125
    InvalidRegisterCount,
    /// Scale factor outside 50-200 percent
    InvalidScaleFactor,
    /// Upload interval is not one of the selectable values
    InvalidUploadInterval,
    /// Poll interval outside 1 s - 1 h
    InvalidPollInterval,
}

/// Flat view of the runtime-tunable settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub poll_interval_ms: u32,
    pub persist_divider: u32,
    pub upload_divider: u32,
    pub upload_interval_ms: u32,
    pub slave_address: u8,
    pub function_code: u8,
    pub register_address: u16,
    pub register_count: u16,
    pub counting_enabled: bool,
    pub acquisition_enabled: bool,
}

impl Settings {
    /// Snapshot the settings of a configuration
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            poll_interval_ms: config.acquisition.poll_interval_ms,
            persist_divider: config.counting.persist_divider,
            upload_divider: config.counting.upload_divider,
            upload_interval_ms: config.upload.interval.as_ms(),
            slave_address: config.acquisition.slave_address,
            function_code: config.acquisition.function_code,
            register_address: config.acquisition.register_address,
            register_count: config.acquisition.register_count,
            counting_enabled: config.counting.enabled,
            acquisition_enabled: config.acquisition.enabled,
        }
    }
}

/// New network identity
///
/// Empty strings keep the current value. The mode is always applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkUpdate {
    pub mode: NetworkMode,
    pub ssid: String<SSID_LEN>,
    pub password: String<PASSWORD_LEN>,
    pub static_ip: String<IP_LEN>,
    pub gateway: String<IP_LEN>,
    pub subnet_mask: String<IP_LEN>,
}

/// Update to acquisition, counting and network settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettingsUpdate {
    pub poll_interval_ms: Option<u32>,
    pub persist_divider: Option<u32>,
    pub slave_address: Option<u8>,
    pub function_code: Option<u8>,
    pub register_address: Option<u16>,
    pub register_count: Option<u16>,
    pub counting_enabled: Option<bool>,
    pub acquisition_enabled: Option<bool>,
    pub network: Option<NetworkUpdate>,
}

/// Update to the remote collector settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UploadUpdate {
    pub host: Option<String<HOST_LEN>>,
    pub counter_path: Option<String<PATH_LEN>>,
    pub temp_path: Option<String<PATH_LEN>>,
    pub upload_interval_ms: Option<u32>,
    pub upload_divider: Option<u32>,
    pub device_id: Option<String<ID_LEN>>,
    pub production_order_id: Option<String<ID_LEN>>,
    pub scale_factor_percent: Option<u16>,
}

/// What an applied update changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpdateSummary {
    /// Network identity differs from before (takes effect after reset)
    pub network_changed: bool,
    /// Counting went from disabled to enabled
    pub counting_reenabled: bool,
    /// First rejected field, if any
    pub rejected: Option<ConfigError>,
}

impl UpdateSummary {
    fn reject(&mut self, error: ConfigError) {
        if self.rejected.is_none() {
            self.rejected = Some(error);
        }
    }
}

fn check_divider(value: u32) -> Result<u32, ConfigError> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidDivider)
    }
}

fn check_slave_address(value: u8) -> Result<u8, ConfigError> {
    if (1..=247).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidSlaveAddress)
    }
}

fn check_function_code(value: u8) -> Result<u8, ConfigError> {
    if value == FUNC_READ_HOLDING || value == FUNC_READ_INPUT {
        Ok(value)
    } else {
        Err(ConfigError::InvalidFunctionCode)
    }
}

fn check_register_count(value: u16) -> Result<u16, ConfigError> {
    if (1..=MAX_REGISTER_COUNT).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidRegisterCount)
    }
}

fn check_poll_interval(value: u32) -> Result<u32, ConfigError> {
    if (MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidPollInterval)
    }
}

fn check_scale_factor(value: u16) -> Result<u16, ConfigError> {
    if SCALE_FACTOR_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidScaleFactor)
    }
}

/// Assign `value` to `slot` when present and valid
fn apply_checked<T>(
    slot: &mut T,
    value: Option<T>,
    check: fn(T) -> Result<T, ConfigError>,
    summary: &mut UpdateSummary,
) {
    if let Some(value) = value {
        match check(value) {
            Ok(v) => *slot = v,
            Err(e) => summary.reject(e),
        }
    }
}

fn apply_text<const N: usize>(slot: &mut String<N>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        *slot = super::types::text(value);
    }
}

impl SettingsUpdate {
    /// Apply this update to a configuration
    pub fn apply_to(&self, config: &mut DeviceConfig) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        let acq = &mut config.acquisition;

        apply_checked(
            &mut acq.poll_interval_ms,
            self.poll_interval_ms,
            check_poll_interval,
            &mut summary,
        );
        apply_checked(
            &mut acq.slave_address,
            self.slave_address,
            check_slave_address,
            &mut summary,
        );
        apply_checked(
            &mut acq.function_code,
            self.function_code,
            check_function_code,
            &mut summary,
        );
        if let Some(register) = self.register_address {
            acq.register_address = register;
        }
        apply_checked(
            &mut acq.register_count,
            self.register_count,
            check_register_count,
            &mut summary,
        );
        if let Some(enabled) = self.acquisition_enabled {
            acq.enabled = enabled;
        }

        apply_checked(
            &mut config.counting.persist_divider,
            self.persist_divider,
            check_divider,
            &mut summary,
        );
        if let Some(enabled) = self.counting_enabled {
            summary.counting_reenabled = enabled && !config.counting.enabled;
            config.counting.enabled = enabled;
        }

        if let Some(network) = &self.network {
            let before = config.network.clone();
            let net = &mut config.network;
            net.mode = network.mode;
            apply_text(&mut net.ssid, &network.ssid);
            apply_text(&mut net.password, &network.password);
            apply_text(&mut net.static_ip, &network.static_ip);
            apply_text(&mut net.gateway, &network.gateway);
            apply_text(&mut net.subnet_mask, &network.subnet_mask);
            summary.network_changed = *net != before;
        }

        summary
    }
}

impl UploadUpdate {
    /// Apply this update to a configuration
    pub fn apply_to(&self, config: &mut DeviceConfig) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        let upload = &mut config.upload;

        if let Some(host) = &self.host {
            apply_text(&mut upload.host, host);
        }
        if let Some(path) = &self.counter_path {
            let path: String<PATH_LEN> = normalize_path(path.trim());
            apply_text(&mut upload.counter_path, &path);
        }
        if let Some(path) = &self.temp_path {
            let path: String<PATH_LEN> = normalize_path(path.trim());
            apply_text(&mut upload.temp_path, &path);
        }
        if let Some(id) = &self.device_id {
            apply_text(&mut upload.device_id, id);
        }
        if let Some(id) = &self.production_order_id {
            apply_text(&mut upload.production_order_id, id);
        }
        if let Some(ms) = self.upload_interval_ms {
            match UploadInterval::from_ms(ms) {
                Some(interval) => upload.interval = interval,
                None => summary.reject(ConfigError::InvalidUploadInterval),
            }
        }

        apply_checked(
            &mut config.counting.upload_divider,
            self.upload_divider,
            check_divider,
            &mut summary,
        );
        apply_checked(
            &mut config.acquisition.scale_factor_percent,
            self.scale_factor_percent,
            check_scale_factor,
            &mut summary,
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::text;

    #[test]
    fn test_settings_snapshot() {
        let settings = Settings::from_config(&DeviceConfig::default());
        assert_eq!(settings.poll_interval_ms, 10_000);
        assert_eq!(settings.persist_divider, 10);
        assert_eq!(settings.upload_divider, 10);
        assert_eq!(settings.upload_interval_ms, 60_000);
        assert_eq!(settings.slave_address, 1);
        assert_eq!(settings.function_code, 3);
        assert!(settings.counting_enabled);
        assert!(settings.acquisition_enabled);
    }

    #[test]
    fn test_empty_update_changes_nothing() {
        let mut config = DeviceConfig::default();
        let summary = SettingsUpdate::default().apply_to(&mut config);
        assert_eq!(config, DeviceConfig::default());
        assert_eq!(summary, UpdateSummary::default());
    }

    #[test]
    fn test_invalid_fields_keep_previous_values() {
        let mut config = DeviceConfig::default();
        let update = SettingsUpdate {
            persist_divider: Some(0),
            slave_address: Some(0),
            function_code: Some(0x06),
            register_count: Some(200),
            register_address: Some(0x0010),
            ..Default::default()
        };
        let summary = update.apply_to(&mut config);

        assert_eq!(config.counting.persist_divider, 10);
        assert_eq!(config.acquisition.slave_address, 1);
        assert_eq!(config.acquisition.function_code, 0x03);
        assert_eq!(config.acquisition.register_count, 1);
        // Valid fields still apply
        assert_eq!(config.acquisition.register_address, 0x0010);
        assert_eq!(summary.rejected, Some(ConfigError::InvalidSlaveAddress));
    }

    #[test]
    fn test_counting_reenabled_flag() {
        let mut config = DeviceConfig::default();
        config.counting.enabled = false;

        let update = SettingsUpdate {
            counting_enabled: Some(true),
            ..Default::default()
        };
        assert!(update.apply_to(&mut config).counting_reenabled);
        // Already enabled: not a re-enable
        assert!(!update.apply_to(&mut config).counting_reenabled);
    }

    #[test]
    fn test_network_update_keeps_blank_fields() {
        let mut config = DeviceConfig::default();
        config.network.ssid = text("plant-ap");
        config.network.password = text("secret");

        let update = SettingsUpdate {
            network: Some(NetworkUpdate {
                mode: NetworkMode::Static,
                static_ip: text("192.168.1.50"),
                ..Default::default()
            }),
            ..Default::default()
        };
        let summary = update.apply_to(&mut config);

        assert!(summary.network_changed);
        assert_eq!(config.network.mode, NetworkMode::Static);
        assert_eq!(config.network.ssid.as_str(), "plant-ap");
        assert_eq!(config.network.password.as_str(), "secret");
        assert_eq!(config.network.static_ip.as_str(), "192.168.1.50");
    }

    #[test]
    fn test_identical_network_update_is_not_a_change() {
        let mut config = DeviceConfig::default();
        let update = SettingsUpdate {
            network: Some(NetworkUpdate::default()),
            ..Default::default()
        };
        assert!(!update.apply_to(&mut config).network_changed);
    }

    #[test]
    fn test_upload_update() {
        let mut config = DeviceConfig::default();
        let update = UploadUpdate {
            host: Some(text("collector.local")),
            temp_path: Some(text("api%2Ftemp.php")),
            counter_path: Some(text("   ")),
            upload_interval_ms: Some(300_000),
            upload_divider: Some(25),
            scale_factor_percent: Some(105),
            ..Default::default()
        };
        let summary = update.apply_to(&mut config);

        assert_eq!(summary.rejected, None);
        assert_eq!(config.upload.host.as_str(), "collector.local");
        assert_eq!(config.upload.temp_path.as_str(), "api/temp.php");
        assert_eq!(
            config.upload.counter_path.as_str(),
            "iot2026/smart01/insert2C.php"
        );
        assert_eq!(config.upload.interval, UploadInterval::FiveMinutes);
        assert_eq!(config.counting.upload_divider, 25);
        assert_eq!(config.acquisition.scale_factor_percent, 105);
    }

    #[test]
    fn test_upload_update_rejections() {
        let mut config = DeviceConfig::default();
        let update = UploadUpdate {
            upload_interval_ms: Some(45_000),
            scale_factor_percent: Some(250),
            ..Default::default()
        };
        let summary = update.apply_to(&mut config);

        assert_eq!(summary.rejected, Some(ConfigError::InvalidUploadInterval));
        assert_eq!(config.upload.interval, UploadInterval::OneMinute);
        assert_eq!(config.acquisition.scale_factor_percent, 100);
    }
}
