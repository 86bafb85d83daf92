//! Bridge link framing
//!
//! ```text
//! START  0x7E
//! LEN    payload length, 0..=240
//! TYPE   message type
//! DATA   LEN bytes
//! CRC    CRC-16/MODBUS over LEN, TYPE and DATA, low byte first
//! ```
//!
//! START is not escaped inside DATA. The parser only looks for it between
//! frames, so a payload may contain 0x7E freely.

use heapless::Vec;

use crate::crc::Crc16;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0x7E;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 240;

/// START, LEN, TYPE and the two CRC bytes
const OVERHEAD: usize = 5;

/// Largest encoded frame
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_SIZE + OVERHEAD;

// Controller to bridge
pub const MSG_TEMP_UPLOAD: u8 = 0x01;
pub const MSG_COUNTER_UPLOAD: u8 = 0x02;
pub const MSG_CONTROL_RESPONSE: u8 = 0x03;
pub const MSG_HEARTBEAT: u8 = 0x04;
pub const MSG_NETWORK_CONFIG: u8 = 0x05;

// Bridge to controller
pub const MSG_CONTROL_REQUEST: u8 = 0x20;
pub const MSG_TIME_SYNC: u8 = 0x21;
pub const MSG_CONNECTIVITY: u8 = 0x22;
pub const MSG_UPLOAD_FAILED: u8 = 0x23;

/// Link framing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// More than [`MAX_PAYLOAD_SIZE`] bytes of payload
    PayloadTooLarge,
    /// Received CRC does not match the frame contents
    InvalidChecksum,
    /// LEN byte out of range
    InvalidFrame,
    /// Output buffer cannot hold the encoded frame
    BufferTooSmall,
}

/// One link message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

fn frame_crc(msg_type: u8, payload: &[u8]) -> Crc16 {
    let mut crc = Crc16::new();
    crc.update(&[payload.len() as u8, msg_type]);
    crc.update(payload);
    crc
}

impl Frame {
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Length of the encoded frame
    pub fn encoded_len(&self) -> usize {
        self.payload.len() + OVERHEAD
    }

    /// Write the encoded frame to `buffer`, returning its length
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let len = self.encoded_len();
        let out = buffer.get_mut(..len).ok_or(FrameError::BufferTooSmall)?;
        let (header, rest) = out.split_at_mut(3);
        let (data, crc) = rest.split_at_mut(self.payload.len());

        header.copy_from_slice(&[FRAME_START, self.payload.len() as u8, self.msg_type]);
        data.copy_from_slice(&self.payload);
        crc.copy_from_slice(&frame_crc(self.msg_type, &self.payload).finish().to_le_bytes());
        Ok(len)
    }

    /// Encode into an owned buffer
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut out = Vec::new();
        out.resize(self.encoded_len(), 0)
            .map_err(|_| FrameError::BufferTooSmall)?;
        self.encode(&mut out)?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Length,
    Type { len: u8 },
    Data { len: u8 },
    CrcLow,
    CrcHigh { low: u8 },
}

/// Byte-at-a-time frame decoder
///
/// Bytes outside a frame are skipped until the next START. Any error drops
/// the partial frame and returns the decoder to that search.
#[derive(Debug, Clone)]
pub struct FrameParser {
    stage: Stage,
    msg_type: u8,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
    crc: Crc16,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            msg_type: 0,
            payload: Vec::new(),
            crc: Crc16::new(),
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.payload.clear();
        self.crc = Crc16::new();
    }

    /// Feed one byte, returning a frame when one completes
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        self.stage = match self.stage {
            Stage::Idle if byte == FRAME_START => Stage::Length,
            Stage::Idle => Stage::Idle,
            Stage::Length => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.crc.update_byte(byte);
                Stage::Type { len: byte }
            }
            Stage::Type { len } => {
                self.crc.update_byte(byte);
                self.msg_type = byte;
                if len == 0 {
                    Stage::CrcLow
                } else {
                    Stage::Data { len }
                }
            }
            Stage::Data { len } => {
                self.crc.update_byte(byte);
                // LEN was bounded above, so this cannot overflow
                let _ = self.payload.push(byte);
                if self.payload.len() == len as usize {
                    Stage::CrcLow
                } else {
                    Stage::Data { len }
                }
            }
            Stage::CrcLow => Stage::CrcHigh { low: byte },
            Stage::CrcHigh { low } => {
                let valid = u16::from_le_bytes([low, byte]) == self.crc.finish();
                let frame = Frame {
                    msg_type: self.msg_type,
                    payload: core::mem::take(&mut self.payload),
                };
                self.reset();
                return if valid {
                    Ok(Some(frame))
                } else {
                    Err(FrameError::InvalidChecksum)
                };
            }
        };
        Ok(None)
    }

    /// Feed bytes until the first complete frame
    ///
    /// Bytes after that frame are left unconsumed.
    pub fn feed_bytes(&mut self, data: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in data {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
