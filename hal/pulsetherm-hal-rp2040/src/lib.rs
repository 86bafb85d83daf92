//! RP2040-specific HAL for the Pulsetherm firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `pulsetherm-hal` traits:
//!
//! - Flash record storage (implements `pulsetherm_hal::RecordStore`)
//! - Sensor serial bus over a buffered UART (implements `pulsetherm_hal::SerialBus`)

#![no_std]

pub mod flash;
pub mod uart;

// Re-export shared traits from pulsetherm-hal for convenience
pub use pulsetherm_hal::{RecordStore, SerialBus, StorageKey};
