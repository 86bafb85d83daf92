//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in pulsetherm-core for the device's peripherals:
//!
//! - Character LCD (HD44780 behind a PCF8574 I2C backpack)

#![no_std]
#![deny(unsafe_code)]

pub mod display;
