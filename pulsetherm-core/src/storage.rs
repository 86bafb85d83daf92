//! Record-store backed persistence
//!
//! Counters and configuration are stored as versioned postcard records.
//! When no versioned record exists, the line-oriented record written by
//! older firmware is loaded instead and migrated to the versioned key.

use core::str;

use pulsetherm_hal::{FlashError, RecordStore, StorageKey};

use crate::config::legacy::{self, LEGACY_CONFIG_LEN, LEGACY_COUNTERS_LEN};
use crate::config::record::{MAX_CONFIG_RECORD_LEN, MAX_COUNTER_RECORD_LEN};
use crate::config::{ConfigRecord, CounterRecord, DeviceConfig};
use crate::counter::PulseCounters;
use crate::traits::{Persistence, PersistenceError};

/// [`Persistence`] over a keyed [`RecordStore`]
pub struct RecordPersistence<S> {
    store: S,
}

impl<S: RecordStore> RecordPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Give back the underlying store
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Read a legacy text record, `NotFound` if absent
    fn read_legacy<'b>(
        &mut self,
        key: StorageKey,
        buffer: &'b mut [u8],
    ) -> Result<&'b str, PersistenceError> {
        let len = self.store.read(key, buffer)?;
        str::from_utf8(&buffer[..len]).map_err(|_| PersistenceError::Corrupted)
    }

    /// Drop the legacy record once its versioned copy is written
    fn migrate(&mut self, legacy_key: StorageKey, written: Result<(), PersistenceError>) {
        if written.is_ok() {
            let _ = self.store.remove(legacy_key);
        }
    }
}

impl<S: RecordStore> Persistence for RecordPersistence<S> {
    fn load_counters(&mut self) -> Result<PulseCounters, PersistenceError> {
        let mut buffer = [0u8; MAX_COUNTER_RECORD_LEN];
        match self.store.read(StorageKey::Counters, &mut buffer) {
            Ok(len) => CounterRecord::decode(&buffer[..len]),
            Err(FlashError::NotFound) => {
                let mut text = [0u8; LEGACY_COUNTERS_LEN];
                let record = self.read_legacy(StorageKey::LegacyCounters, &mut text)?;
                let counters = legacy::parse_counters(record);
                let written = self.save_counters(&counters);
                self.migrate(StorageKey::LegacyCounters, written);
                Ok(counters)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_counters(&mut self, counters: &PulseCounters) -> Result<(), PersistenceError> {
        let mut buffer = [0u8; MAX_COUNTER_RECORD_LEN];
        let bytes = CounterRecord::new(*counters).encode(&mut buffer)?;
        self.store.write(StorageKey::Counters, bytes)?;
        Ok(())
    }

    fn load_config(&mut self) -> Result<DeviceConfig, PersistenceError> {
        let mut buffer = [0u8; MAX_CONFIG_RECORD_LEN];
        match self.store.read(StorageKey::Config, &mut buffer) {
            Ok(len) => ConfigRecord::decode(&buffer[..len]),
            Err(FlashError::NotFound) => {
                let mut text = [0u8; LEGACY_CONFIG_LEN];
                let record = self.read_legacy(StorageKey::LegacyConfig, &mut text)?;
                let config = legacy::parse_config(record);
                let written = self.save_config(&config);
                self.migrate(StorageKey::LegacyConfig, written);
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_config(&mut self, config: &DeviceConfig) -> Result<(), PersistenceError> {
        let mut buffer = [0u8; MAX_CONFIG_RECORD_LEN];
        let bytes = ConfigRecord::new(config.clone()).encode(&mut buffer)?;
        self.store.write(StorageKey::Config, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::record::RECORD_VERSION;
    use heapless::Vec;

    const SLOTS: usize = 4;

    #[derive(Default)]
    struct MemoryStore {
        slots: [Option<Vec<u8, MAX_CONFIG_RECORD_LEN>>; SLOTS],
        fail_writes: bool,
    }

    impl MemoryStore {
        fn put(&mut self, key: StorageKey, data: &[u8]) {
            self.slots[key.as_u8() as usize] = Vec::from_slice(data).ok();
        }

        fn get(&self, key: StorageKey) -> Option<&[u8]> {
            self.slots[key.as_u8() as usize].as_deref()
        }
    }

    impl RecordStore for MemoryStore {
        fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            let data = self.get(key).ok_or(FlashError::NotFound)?;
            if data.len() > buffer.len() {
                return Err(FlashError::BufferTooSmall);
            }
            buffer[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            if self.fail_writes {
                return Err(FlashError::Full);
            }
            self.put(key, data);
            Ok(())
        }

        fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
            self.slots[key.as_u8() as usize] = None;
            Ok(())
        }
    }

    #[test]
    fn test_empty_store() {
        let mut persistence = RecordPersistence::new(MemoryStore::default());
        assert_eq!(persistence.load_counters(), Err(PersistenceError::NotFound));
        assert_eq!(persistence.load_config(), Err(PersistenceError::NotFound));
    }

    #[test]
    fn test_save_and_load() {
        let mut persistence = RecordPersistence::new(MemoryStore::default());
        let counters = PulseCounters {
            total: 12,
            accumulated: 3400,
            divider: 5,
        };
        persistence.save_counters(&counters).unwrap();
        assert_eq!(persistence.load_counters(), Ok(counters));

        let mut config = DeviceConfig::default();
        config.acquisition.poll_interval_ms = 2_000;
        persistence.save_config(&config).unwrap();
        assert_eq!(persistence.load_config(), Ok(config));

        let store = persistence.into_inner();
        assert_eq!(store.get(StorageKey::Counters).unwrap()[0], RECORD_VERSION);
    }

    #[test]
    fn test_legacy_counters_are_migrated() {
        let mut store = MemoryStore::default();
        store.put(StorageKey::LegacyCounters, b"42\n1042\n7\n");
        let mut persistence = RecordPersistence::new(store);

        let expected = PulseCounters {
            total: 42,
            accumulated: 1042,
            divider: 7,
        };
        assert_eq!(persistence.load_counters(), Ok(expected));

        let store = persistence.into_inner();
        assert!(store.get(StorageKey::LegacyCounters).is_none());
        let record = store.get(StorageKey::Counters).unwrap();
        assert_eq!(CounterRecord::decode(record), Ok(expected));
    }

    #[test]
    fn test_legacy_config_kept_when_migration_fails() {
        let mut store = MemoryStore::default();
        let legacy = legacy::format_config(&DeviceConfig::default());
        store.put(StorageKey::LegacyConfig, legacy.as_bytes());
        store.fail_writes = true;
        let mut persistence = RecordPersistence::new(store);

        assert_eq!(persistence.load_config(), Ok(DeviceConfig::default()));
        let store = persistence.into_inner();
        assert!(store.get(StorageKey::LegacyConfig).is_some());
        assert!(store.get(StorageKey::Config).is_none());
    }

    #[test]
    fn test_versioned_record_preferred() {
        let mut store = MemoryStore::default();
        store.put(StorageKey::LegacyCounters, b"1\n1\n1\n");
        let mut persistence = RecordPersistence::new(store);
        let counters = PulseCounters {
            total: 9,
            accumulated: 9,
            divider: 0,
        };
        persistence.save_counters(&counters).unwrap();
        assert_eq!(persistence.load_counters(), Ok(counters));
    }

    #[test]
    fn test_bad_records() {
        let mut store = MemoryStore::default();
        store.put(StorageKey::Counters, &[1, 2, 3]);
        store.put(StorageKey::Config, &[]);
        let mut persistence = RecordPersistence::new(store);

        assert_eq!(
            persistence.load_counters(),
            Err(PersistenceError::VersionMismatch)
        );
        assert_eq!(persistence.load_config(), Err(PersistenceError::Corrupted));

        let mut store = MemoryStore::default();
        store.put(StorageKey::LegacyConfig, &[0xFF, 0xFE]);
        let mut persistence = RecordPersistence::new(store);
        assert_eq!(persistence.load_config(), Err(PersistenceError::Corrupted));
    }

    #[test]
    fn test_write_failure() {
        let store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let mut persistence = RecordPersistence::new(store);
        assert_eq!(
            persistence.save_counters(&PulseCounters::default()),
            Err(PersistenceError::Full)
        );
    }
}
