//! Admin interface trait

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::config::types::IP_LEN;
use crate::config::{ConfigError, Settings, SettingsUpdate, UploadConfig, UploadUpdate};
use crate::scheduler::StatusReport;
use crate::traits::PersistenceError;

/// Request from the admin interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlRequest {
    /// Read the tunable settings
    GetSettings,
    /// Read the upload target settings
    GetUpload,
    /// Change acquisition, counting or network settings
    ApplySettings(SettingsUpdate),
    /// Change upload settings
    ApplyUpload(UploadUpdate),
    /// Zero the resettable total
    ResetCounters,
    /// Zero the accumulated total and the resettable total
    ResetAccumulator,
    /// Restart the firmware
    ResetDevice,
    /// Read the dashboard status
    Status,
}

/// Result of applying a settings update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ApplyResult {
    /// First rejected field; other fields were applied
    pub rejected: Option<ConfigError>,
    /// Configuration save failure
    pub save_error: Option<PersistenceError>,
    /// Network identity changed and waits for a reset
    pub restart_required: bool,
}

/// Answer to a [`ControlRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlResponse {
    Settings(Settings),
    Upload(UploadConfig),
    Applied(ApplyResult),
    /// Counters were reset; carries the counter save failure, if any
    CountersReset(Option<PersistenceError>),
    /// The device is about to restart
    Restarting,
    Status(StatusReport),
}

/// Network link state shown on the connectivity page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Connectivity {
    /// Assigned IPv4 address
    pub ip: Option<String<IP_LEN>>,
    /// Received signal strength
    pub rssi_dbm: Option<i16>,
}

/// Admin interface
///
/// Polled once per tick. `poll_request` must not block.
pub trait ControlPlane {
    /// Take the next pending request, if any
    fn poll_request(&mut self) -> Option<ControlRequest>;

    /// Answer the request last returned by `poll_request`
    fn respond(&mut self, response: &ControlResponse);

    /// Current network link state
    fn connectivity(&self) -> Connectivity;
}
