//! Versioned binary records (postcard)

use serde::{Deserialize, Serialize};

use super::types::DeviceConfig;
use crate::counter::PulseCounters;
use crate::traits::PersistenceError;

/// Current record format version
///
/// Version 1 was the line-oriented text format; version 2 added the poll
/// interval to the configuration.
pub const RECORD_VERSION: u8 = 2;

/// Buffer size that fits any encoded counter record
pub const MAX_COUNTER_RECORD_LEN: usize = 32;

/// Buffer size that fits any encoded config record
pub const MAX_CONFIG_RECORD_LEN: usize = 768;

/// Persisted pulse counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub version: u8,
    pub counters: PulseCounters,
}

/// Persisted device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub version: u8,
    pub config: DeviceConfig,
}

/// postcard encodes a leading `u8` as a single raw byte
fn check_version(bytes: &[u8]) -> Result<(), PersistenceError> {
    match bytes.first() {
        None => Err(PersistenceError::Corrupted),
        Some(&RECORD_VERSION) => Ok(()),
        Some(_) => Err(PersistenceError::VersionMismatch),
    }
}

impl CounterRecord {
    /// Wrap counters in a current-version record
    pub const fn new(counters: PulseCounters) -> Self {
        Self {
            version: RECORD_VERSION,
            counters,
        }
    }

    /// Serialize into `buffer`, returning the used prefix
    pub fn encode<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], PersistenceError> {
        postcard::to_slice(self, buffer).map_err(|_| PersistenceError::Encode)
    }

    /// Deserialize and version-check a record
    pub fn decode(bytes: &[u8]) -> Result<PulseCounters, PersistenceError> {
        check_version(bytes)?;
        let record: CounterRecord =
            postcard::from_bytes(bytes).map_err(|_| PersistenceError::Corrupted)?;
        Ok(record.counters)
    }
}

impl ConfigRecord {
    /// Wrap a configuration in a current-version record
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            version: RECORD_VERSION,
            config,
        }
    }

    /// Serialize into `buffer`, returning the used prefix
    pub fn encode<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], PersistenceError> {
        postcard::to_slice(self, buffer).map_err(|_| PersistenceError::Encode)
    }

    /// Deserialize and version-check a record
    pub fn decode(bytes: &[u8]) -> Result<DeviceConfig, PersistenceError> {
        check_version(bytes)?;
        let record: ConfigRecord =
            postcard::from_bytes(bytes).map_err(|_| PersistenceError::Corrupted)?;
        Ok(record.config)
    }
}
