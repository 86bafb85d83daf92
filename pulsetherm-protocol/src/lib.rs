//! Wire protocols for the Pulsetherm controller
//!
//! Two binary protocols live here:
//!
//! - [`modbus`]: Modbus RTU "read registers" request/response frames used on
//!   the RS-485 sensor bus, with CRC-16/MODBUS integrity checking.
//! - [`link`]: the framed link between the controller and the network
//!   bridge co-processor that handles Wi-Fi, HTTP uploads and the dashboard.
//!
//! ```text
//! Modbus request (8 bytes)
//! ┌──────┬──────┬───────┬───────┬───────┬───────┬───────┬───────┐
//! │ ADDR │ FUNC │ REG_H │ REG_L │ CNT_H │ CNT_L │ CRC_L │ CRC_H │
//! └──────┴──────┴───────┴───────┴───────┴───────┴───────┴───────┘
//!
//! Link frame
//! ┌───────┬────────┬──────┬─────────────┬───────┬───────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CRC_L │ CRC_H │
//! │ 1B    │ 1B     │ 1B   │ 0–240B      │ 1B    │ 1B    │
//! └───────┴────────┴──────┴─────────────┴───────┴───────┘
//! ```
//!
//! Both use the same checksum: CRC-16 with the reflected polynomial `0xA001`
//! and initial value `0xFFFF`, transmitted low byte first.

#![no_std]
#![deny(unsafe_code)]

pub mod crc;
pub mod link;
pub mod modbus;

pub use crc::{crc16, Crc16};
pub use link::{Frame, FrameError, FrameParser, FRAME_START, MAX_PAYLOAD_SIZE};
pub use modbus::{ProtocolError, ReadRequest, ReadResponse};
