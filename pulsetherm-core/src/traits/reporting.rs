//! Remote upload trait

use serde::{Deserialize, Serialize};

use crate::config::UploadConfig;

/// Errors from the upload transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No network link
    NotConnected,
    /// Transport queue full, request dropped
    Busy,
    /// The collector answered with a non-success status
    Rejected(u16),
    /// Request could not be sent
    SendFailed,
}

/// Temperature sample for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureUpload {
    /// Scaled value in tenths of a degree
    pub value_x10: u32,
    /// Scale factor that was applied
    pub scale_factor_percent: u16,
}

/// Counter state for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterUpload {
    pub total: u32,
    pub accumulated: u32,
    pub rate_per_minute: u32,
}

/// Best-effort upload transport
///
/// Calls must not block beyond handing the request to the transport. There
/// is no retry: a failed upload is lost.
pub trait Reporting {
    /// Upload a temperature sample
    fn send_temperature(
        &mut self,
        target: &UploadConfig,
        sample: &TemperatureUpload,
    ) -> Result<(), TransportError>;

    /// Upload counter state
    fn send_counter(
        &mut self,
        target: &UploadConfig,
        counters: &CounterUpload,
    ) -> Result<(), TransportError>;
}
