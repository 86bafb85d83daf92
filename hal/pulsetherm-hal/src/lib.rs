//! Pulsetherm Hardware Abstraction Layer
//!
//! Board-agnostic I/O traits used by the acquisition core. Chip-specific
//! crates (`pulsetherm-hal-rp2040`) implement them for real peripherals and
//! the core's tests implement them with in-memory mocks.
//!
//! # Traits
//!
//! - [`uart::SerialBus`] - Half-duplex request/response serial bus (RS-485)
//! - [`flash::RecordStore`] - Keyed persistent record storage

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod uart;

pub use flash::{FlashError, RecordStore, StorageKey};
pub use uart::{SerialBus, UartConfig};
