//! Counter and configuration persistence trait

use pulsetherm_hal::FlashError;

use crate::config::DeviceConfig;
use crate::counter::PulseCounters;

/// Errors from loading or saving records
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistenceError {
    /// Storage write failed
    Write,
    /// Storage has no room left
    Full,
    /// No record stored
    NotFound,
    /// Stored record could not be decoded
    Corrupted,
    /// Stored record has a different format version
    VersionMismatch,
    /// Record could not be encoded
    Encode,
}

impl PersistenceError {
    /// Short description for the display and status report
    pub const fn as_str(&self) -> &'static str {
        match self {
            PersistenceError::Write => "write failed",
            PersistenceError::Full => "storage full",
            PersistenceError::NotFound => "not found",
            PersistenceError::Corrupted => "corrupted",
            PersistenceError::VersionMismatch => "version mismatch",
            PersistenceError::Encode => "encode failed",
        }
    }
}

impl From<FlashError> for PersistenceError {
    fn from(e: FlashError) -> Self {
        match e {
            FlashError::NotFound => PersistenceError::NotFound,
            FlashError::Full => PersistenceError::Full,
            FlashError::Corrupted | FlashError::BufferTooSmall => PersistenceError::Corrupted,
            FlashError::Flash | FlashError::Storage => PersistenceError::Write,
        }
    }
}

/// Durable storage for counters and configuration
pub trait Persistence {
    /// Load the last saved counters
    fn load_counters(&mut self) -> Result<PulseCounters, PersistenceError>;

    /// Save counters
    fn save_counters(&mut self, counters: &PulseCounters) -> Result<(), PersistenceError>;

    /// Load the last saved configuration
    fn load_config(&mut self) -> Result<DeviceConfig, PersistenceError>;

    /// Save configuration
    fn save_config(&mut self, config: &DeviceConfig) -> Result<(), PersistenceError>;
}
