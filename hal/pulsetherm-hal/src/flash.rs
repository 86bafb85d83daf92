//! Persistent record storage abstractions
//!
//! The device keeps a handful of small records (counters, configuration)
//! in a wear-levelled key-value area. Writes happen at most once per
//! persistence divider, so implementations are free to block for the
//! duration of an erase/program cycle.

/// Storage keys for persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Pulse counters (binary postcard record)
    Counters = 0,
    /// Device configuration (binary postcard record)
    Config = 1,
    /// Pulse counters in the line-oriented text format of older firmware
    LegacyCounters = 2,
    /// Device configuration in the line-oriented text format of older firmware
    LegacyConfig = 3,
}

impl StorageKey {
    /// Discriminant byte used as the on-flash key
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Key for a discriminant byte, `None` for unknown keys
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::Counters),
            1 => Some(StorageKey::Config),
            2 => Some(StorageKey::LegacyCounters),
            3 => Some(StorageKey::LegacyConfig),
            _ => None,
        }
    }
}

/// Errors from record storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// The flash driver reported an erase or program failure
    Flash,
    /// The storage layer failed for another reason
    Storage,
    /// No record under this key
    NotFound,
    /// Record does not fit the caller's buffer
    BufferTooSmall,
    /// Stored item failed its integrity check
    Corrupted,
    /// No free space left after garbage collection
    Full,
}

/// Keyed record storage
///
/// Blocking counterpart of a wear-levelled map. A `write` replaces the
/// previous value for the key.
pub trait RecordStore {
    /// Read a record into `buffer`, returning its length
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError>;

    /// Store a record, replacing any previous value
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError>;

    /// Remove a record
    ///
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError>;

    /// Whether a record is stored under `key`
    fn exists(&mut self, key: StorageKey) -> bool {
        let mut buf = [0u8; 1];
        !matches!(self.read(key, &mut buf), Err(FlashError::NotFound))
    }
}

#[cfg(feature = "sequential-storage")]
mod map_key {
    use sequential_storage::map::{Key, SerializationError};

    use super::StorageKey;

    /// Keys are stored as their single discriminant byte
    impl Key for StorageKey {
        fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
            let slot = buffer.first_mut().ok_or(SerializationError::BufferTooSmall)?;
            *slot = self.as_u8();
            Ok(1)
        }

        fn deserialize_from(buffer: &[u8]) -> Result<(Self, usize), SerializationError> {
            let byte = *buffer.first().ok_or(SerializationError::BufferTooSmall)?;
            let key = StorageKey::from_u8(byte).ok_or(SerializationError::InvalidFormat)?;
            Ok((key, 1))
        }
    }
}
