//! Board-agnostic core logic for the Pulsetherm field device
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Sensor protocol client (Modbus RTU register reads over RS-485)
//! - Interrupt-safe pulse counter with minute-window rate smoothing
//! - Cooperative scheduler driving polling, persistence, uploads and display
//! - Collaborator traits (persistence, reporting, display, control plane, clock)
//! - Device configuration, settings updates and persisted record formats
//! - Display page text rendering

#![no_std]
#![deny(unsafe_code)]

pub mod acquisition;
pub mod config;
pub mod counter;
pub mod pages;
pub mod scheduler;
pub mod storage;
pub mod traits;
