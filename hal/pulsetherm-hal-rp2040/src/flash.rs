//! Flash record storage for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage
//! in the last 64KB of flash.
//!
//! Implements the blocking `RecordStore` trait from `pulsetherm-hal`. Each
//! call drives the async map operation to completion with `block_on`; the
//! scheduler only writes once per persist divider, so the stall is bounded
//! by one sector erase.

use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use pulsetherm_hal::flash::{FlashError, RecordStore, StorageKey};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const RECORD_PARTITION_SIZE: usize = 64 * 1024;
pub const RECORD_PARTITION_START: usize = FLASH_SIZE - RECORD_PARTITION_SIZE;

// sequential-storage works in whole erase sectors
const _: () = assert!(RECORD_PARTITION_START % ERASE_SIZE == 0);
const _: () = assert!(RECORD_PARTITION_SIZE % ERASE_SIZE == 0);

/// Flash range for the record partition
pub const RECORD_RANGE: core::ops::Range<u32> =
    (RECORD_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Scratch space for one map item (key, record and item header)
const DATA_BUFFER_LEN: usize = 1024;

fn storage_error<E>(e: sequential_storage::Error<E>) -> FlashError {
    match e {
        sequential_storage::Error::Storage { .. } => FlashError::Flash,
        sequential_storage::Error::FullStorage => FlashError::Full,
        sequential_storage::Error::Corrupted { .. } => FlashError::Corrupted,
        sequential_storage::Error::BufferTooSmall(_) => FlashError::BufferTooSmall,
        _ => FlashError::Storage,
    }
}

/// RP2040 flash record storage
pub struct Rp2040RecordStore<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    data_buffer: [u8; DATA_BUFFER_LEN],
}

impl<'d> Rp2040RecordStore<'d> {
    /// Create a new record store
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            data_buffer: [0; DATA_BUFFER_LEN],
        }
    }
}

impl<'d> RecordStore for Rp2040RecordStore<'d> {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let result = block_on(map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            RECORD_RANGE,
            &mut NoCache::new(),
            &mut self.data_buffer,
            &key,
        ));

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                if buffer.len() < len {
                    return Err(FlashError::BufferTooSmall);
                }
                buffer[..len].copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(e) => Err(storage_error(e)),
        }
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        block_on(map::store_item(
            &mut self.flash,
            RECORD_RANGE,
            &mut NoCache::new(),
            &mut self.data_buffer,
            &key,
            &data,
        ))
        .map_err(storage_error)
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
        block_on(map::remove_item(
            &mut self.flash,
            RECORD_RANGE,
            &mut NoCache::new(),
            &mut self.data_buffer,
            &key,
        ))
        .map_err(storage_error)
    }
}
