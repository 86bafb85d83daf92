//! Scheduler status and per-tick reports

use serde::{Deserialize, Serialize};

use pulsetherm_protocol::modbus::ProtocolError;

use crate::acquisition::SensorReading;
use crate::pages::Page;
use crate::traits::{DisplayError, PersistenceError, TransportError};

/// Outcome of the most recent poll slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionStatus {
    /// No poll has run yet
    #[default]
    NotYetRead,
    /// Last poll succeeded; scaled value in tenths
    Ok { value_x10: u32 },
    /// Last poll failed
    Failed(ProtocolError),
    /// Acquisition is switched off
    Disabled,
}

impl AcquisitionStatus {
    /// Scaled value of a successful read
    pub fn value_x10(&self) -> Option<u32> {
        match self {
            AcquisitionStatus::Ok { value_x10 } => Some(*value_x10),
            _ => None,
        }
    }

    /// Error of a failed read
    pub fn error(&self) -> Option<ProtocolError> {
        match self {
            AcquisitionStatus::Failed(e) => Some(*e),
            _ => None,
        }
    }
}

/// Result of the most recent temperature upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendStatus {
    #[default]
    Never,
    Sent,
    Failed(TransportError),
}

/// Dashboard status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub acquisition: AcquisitionStatus,
    /// Most recent failure, kept after later successes for diagnostics
    pub last_error: Option<ProtocolError>,
    /// Wall time of the last poll attempt
    pub last_reading_unix: Option<u32>,
    pub last_temperature_send: SendStatus,
    pub last_counter_send: SendStatus,
    pub total: u32,
    pub accumulated: u32,
    pub display_rate: u32,
    pub counting_enabled: bool,
    pub acquisition_enabled: bool,
    pub clock_synced: bool,
    /// Network settings changed and wait for a reset
    pub restart_required: bool,
}

/// Why the scheduler wants the firmware restarted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartReason {
    /// Reset requested through the control plane
    OperatorReset,
}

/// What the firmware should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    #[default]
    Continue,
    Restart(RestartReason),
}

/// Everything a tick did, for logging by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Rate of a window that closed this tick
    pub window_closed: Option<u32>,
    /// Counter save attempt
    pub counters_saved: Option<Result<(), PersistenceError>>,
    /// Sensor read attempt
    pub reading: Option<Result<SensorReading, ProtocolError>>,
    /// Temperature upload attempt
    pub temperature_sent: Option<Result<(), TransportError>>,
    /// Counter upload attempt
    pub counter_sent: Option<Result<(), TransportError>>,
    /// A control request was served
    pub control_served: bool,
    /// Page pushed to the display
    pub page_shown: Option<Page>,
    /// Display push result; the first failure wins when a tick pushes twice
    pub display: Option<Result<(), DisplayError>>,
}
