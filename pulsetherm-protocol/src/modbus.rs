//! Modbus RTU register read frames
//!
//! Only the two read functions are supported: read holding registers
//! (`0x03`) and read input registers (`0x04`). Both share the same
//! request and response layout.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::crc::crc16;

/// Read holding registers
pub const FUNC_READ_HOLDING: u8 = 0x03;

/// Read input registers
pub const FUNC_READ_INPUT: u8 = 0x04;

/// Size of an encoded read request
pub const REQUEST_LEN: usize = 8;

/// Smallest response that can carry one register
pub const MIN_RESPONSE_LEN: usize = 7;

/// Largest RTU frame
pub const MAX_RESPONSE_LEN: usize = 256;

/// Largest register count a single read may request
pub const MAX_REGISTER_COUNT: u16 = 125;

/// Errors from validating a response frame
///
/// Checks run in declaration order; the first one that fails is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProtocolError {
    /// Nothing was received
    NoResponse,
    /// Fewer bytes than the smallest valid response
    ShortResponse,
    /// Slave address or function code do not echo the request
    HeaderMismatch,
    /// Byte count field is below one register
    InvalidByteCount,
    /// Frame is shorter than the byte count field claims
    LengthMismatch,
    /// Trailing CRC does not match the frame contents
    ChecksumMismatch,
    /// The serial driver reported an I/O failure
    Bus,
}

impl ProtocolError {
    /// Short description for the display and status report
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProtocolError::NoResponse => "no response",
            ProtocolError::ShortResponse => "short response",
            ProtocolError::HeaderMismatch => "header mismatch",
            ProtocolError::InvalidByteCount => "bad byte count",
            ProtocolError::LengthMismatch => "length mismatch",
            ProtocolError::ChecksumMismatch => "crc mismatch",
            ProtocolError::Bus => "bus error",
        }
    }
}

/// A register read request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadRequest {
    /// Slave address (1-247)
    pub slave_address: u8,
    /// Function code (0x03 or 0x04)
    pub function_code: u8,
    /// First register to read
    pub register_address: u16,
    /// Number of registers to read
    pub register_count: u16,
}

impl ReadRequest {
    /// Create a new read request
    pub const fn new(
        slave_address: u8,
        function_code: u8,
        register_address: u16,
        register_count: u16,
    ) -> Self {
        Self {
            slave_address,
            function_code,
            register_address,
            register_count,
        }
    }

    /// The six bytes covered by the checksum
    pub fn payload(&self) -> [u8; 6] {
        let [reg_hi, reg_lo] = self.register_address.to_be_bytes();
        let [cnt_hi, cnt_lo] = self.register_count.to_be_bytes();
        [
            self.slave_address,
            self.function_code,
            reg_hi,
            reg_lo,
            cnt_hi,
            cnt_lo,
        ]
    }

    /// CRC of the request payload
    pub fn checksum(&self) -> u16 {
        crc16(&self.payload())
    }

    /// Encode the request with its checksum appended low byte first
    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let payload = self.payload();
        let [crc_lo, crc_hi] = crc16(&payload).to_le_bytes();

        let mut frame = [0u8; REQUEST_LEN];
        frame[..6].copy_from_slice(&payload);
        frame[6] = crc_lo;
        frame[7] = crc_hi;
        frame
    }

    /// Validate a response to this request
    pub fn parse_response<'a>(&self, resp: &'a [u8]) -> Result<ReadResponse<'a>, ProtocolError> {
        if resp.is_empty() {
            return Err(ProtocolError::NoResponse);
        }
        if resp.len() < MIN_RESPONSE_LEN {
            return Err(ProtocolError::ShortResponse);
        }
        if resp[0] != self.slave_address || resp[1] != self.function_code {
            return Err(ProtocolError::HeaderMismatch);
        }

        let byte_count = resp[2] as usize;
        if byte_count < 2 {
            return Err(ProtocolError::InvalidByteCount);
        }

        let body_len = 3 + byte_count;
        if resp.len() < body_len + 2 {
            return Err(ProtocolError::LengthMismatch);
        }

        let expected = crc16(&resp[..body_len]);
        let received = u16::from_le_bytes([resp[body_len], resp[body_len + 1]]);
        if expected != received {
            return Err(ProtocolError::ChecksumMismatch);
        }

        Ok(ReadResponse {
            slave_address: resp[0],
            function_code: resp[1],
            data: &resp[3..body_len],
        })
    }
}

/// A validated register read response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResponse<'a> {
    /// Responding slave address
    pub slave_address: u8,
    /// Echoed function code
    pub function_code: u8,
    /// Register data (byte count field already stripped)
    pub data: &'a [u8],
}

impl<'a> ReadResponse<'a> {
    /// Get a big-endian register by index
    pub fn register(&self, index: usize) -> Option<u16> {
        let offset = index * 2;
        let bytes = self.data.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// First register value
    ///
    /// A validated response always carries at least one register.
    pub fn first_register(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    /// Number of whole registers in the response
    pub fn register_count(&self) -> usize {
        self.data.len() / 2
    }
}

/// Encode a register read response as a slave would send it
///
/// Returns `None` if the registers do not fit in one RTU frame.
pub fn encode_response(
    slave_address: u8,
    function_code: u8,
    registers: &[u16],
) -> Option<Vec<u8, MAX_RESPONSE_LEN>> {
    if registers.len() > MAX_REGISTER_COUNT as usize {
        return None;
    }

    let mut frame = Vec::new();
    frame.push(slave_address).ok()?;
    frame.push(function_code).ok()?;
    frame.push((registers.len() * 2) as u8).ok()?;
    for register in registers {
        frame.extend_from_slice(&register.to_be_bytes()).ok()?;
    }
    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_le_bytes()).ok()?;
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request() -> ReadRequest {
        ReadRequest::new(1, FUNC_READ_HOLDING, 0, 1)
    }

    fn valid_response(value: u16) -> Vec<u8, MAX_RESPONSE_LEN> {
        encode_response(1, FUNC_READ_HOLDING, &[value]).unwrap()
    }

    #[test]
    fn test_request_encoding() {
        assert_eq!(
            request().encode(),
            [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A]
        );
        assert_eq!(request().checksum(), 0x0A84);
    }

    #[test]
    fn test_request_big_endian_fields() {
        let frame = ReadRequest::new(0x11, FUNC_READ_INPUT, 0x0102, 0x0003).encode();
        assert_eq!(&frame[..6], &[0x11, 0x04, 0x01, 0x02, 0x00, 0x03]);
        assert_eq!(
            u16::from_le_bytes([frame[6], frame[7]]),
            crc16(&frame[..6])
        );
    }

    #[test]
    fn test_parse_valid_response() {
        // 27.1 degrees
        let resp = valid_response(271);
        let parsed = request().parse_response(&resp).unwrap();
        assert_eq!(parsed.slave_address, 1);
        assert_eq!(parsed.function_code, FUNC_READ_HOLDING);
        assert_eq!(parsed.first_register(), 271);
        assert_eq!(parsed.register_count(), 1);
        assert_eq!(parsed.register(1), None);
    }

    #[test]
    fn test_known_wire_bytes() {
        let resp = [0x01, 0x03, 0x02, 0x01, 0x0F, 0xF9, 0xD0];
        let parsed = request().parse_response(&resp).unwrap();
        assert_eq!(parsed.first_register(), 0x010F);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut resp = valid_response(100);
        resp.push(0xFF).unwrap();
        assert!(request().parse_response(&resp).is_ok());
    }

    #[test]
    fn test_empty_is_no_response() {
        assert_eq!(request().parse_response(&[]), Err(ProtocolError::NoResponse));
    }

    #[test]
    fn test_short_response() {
        let resp = valid_response(100);
        assert_eq!(
            request().parse_response(&resp[..6]),
            Err(ProtocolError::ShortResponse)
        );
    }

    #[test]
    fn test_header_mismatch() {
        let resp = encode_response(2, FUNC_READ_HOLDING, &[100]).unwrap();
        assert_eq!(
            request().parse_response(&resp),
            Err(ProtocolError::HeaderMismatch)
        );

        // Exception response sets the function high bit
        let resp = [0x01, 0x83, 0x02, 0xC0, 0xF1, 0x00, 0x00];
        assert_eq!(
            request().parse_response(&resp),
            Err(ProtocolError::HeaderMismatch)
        );
    }

    #[test]
    fn test_invalid_byte_count() {
        let resp = [0x01, 0x03, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            request().parse_response(&resp),
            Err(ProtocolError::InvalidByteCount)
        );
    }

    #[test]
    fn test_length_mismatch() {
        // Claims two registers but carries one
        let mut resp = valid_response(100);
        resp[2] = 4;
        assert_eq!(
            request().parse_response(&resp),
            Err(ProtocolError::LengthMismatch)
        );
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut resp = valid_response(100);
        let last = resp.len() - 1;
        resp[last] ^= 0x01;
        assert_eq!(
            request().parse_response(&resp),
            Err(ProtocolError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_header_checked_before_byte_count() {
        let resp = [0x09, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            request().parse_response(&resp),
            Err(ProtocolError::HeaderMismatch)
        );
    }

    #[test]
    fn test_multiple_registers() {
        let req = ReadRequest::new(7, FUNC_READ_INPUT, 0x10, 3);
        let resp = encode_response(7, FUNC_READ_INPUT, &[1, 0xBEEF, 3]).unwrap();
        let parsed = req.parse_response(&resp).unwrap();
        assert_eq!(parsed.register_count(), 3);
        assert_eq!(parsed.register(1), Some(0xBEEF));
        assert_eq!(parsed.first_register(), 1);
    }

    #[test]
    fn test_encode_response_limit() {
        let registers = [0u16; 126];
        assert!(encode_response(1, FUNC_READ_HOLDING, &registers).is_none());
        assert!(encode_response(1, FUNC_READ_HOLDING, &registers[..125]).is_some());
    }

    proptest! {
        #[test]
        fn prop_valid_frame_decodes_first_register(
            slave in 1u8..=247,
            input in any::<bool>(),
            value in any::<u16>(),
        ) {
            let function = if input { FUNC_READ_INPUT } else { FUNC_READ_HOLDING };
            let req = ReadRequest::new(slave, function, 0, 1);
            let resp = encode_response(slave, function, &[value]).unwrap();
            let parsed = req.parse_response(&resp).unwrap();
            prop_assert_eq!(parsed.first_register(), value);
        }

        #[test]
        fn prop_single_byte_flip_never_yields_value(
            value in any::<u16>(),
            index in 0usize..7,
            mask in 1u8..=255,
        ) {
            let mut resp = valid_response(value);
            resp[index] ^= mask;
            let result = request().parse_response(&resp);
            prop_assert!(result.is_err());
            prop_assert_ne!(result, Err(ProtocolError::NoResponse));
            prop_assert_ne!(result, Err(ProtocolError::ShortResponse));
        }

        #[test]
        fn prop_multi_register_frame_decodes_every_register(
            registers in proptest::collection::vec(any::<u16>(), 1..=4),
        ) {
            let req = ReadRequest::new(1, FUNC_READ_HOLDING, 0, registers.len() as u16);
            let resp = encode_response(1, FUNC_READ_HOLDING, &registers).unwrap();
            prop_assert_eq!(resp.len(), 5 + registers.len() * 2);

            let parsed = req.parse_response(&resp).unwrap();
            prop_assert_eq!(parsed.register_count(), registers.len());
            for (i, value) in registers.iter().enumerate() {
                prop_assert_eq!(parsed.register(i), Some(*value));
            }
        }

        #[test]
        fn prop_single_byte_flip_in_multi_register_frame(
            registers in proptest::collection::vec(any::<u16>(), 2..=4),
            index in any::<prop::sample::Index>(),
            mask in 1u8..=255,
        ) {
            let req = ReadRequest::new(1, FUNC_READ_HOLDING, 0, registers.len() as u16);
            let mut resp = encode_response(1, FUNC_READ_HOLDING, &registers).unwrap();
            let i = index.index(resp.len());
            resp[i] ^= mask;

            match req.parse_response(&resp) {
                // Only a shortened byte count can land on a matching CRC
                Ok(parsed) => {
                    prop_assert_eq!(i, 2);
                    prop_assert!(parsed.register_count() < registers.len());
                }
                Err(e) => {
                    prop_assert_ne!(e, ProtocolError::NoResponse);
                    prop_assert_ne!(e, ProtocolError::ShortResponse);
                }
            }
        }

        #[test]
        fn prop_truncated_multi_register_frame_fails_length_check(
            registers in proptest::collection::vec(any::<u16>(), 2..=4),
            cut in 1usize..=2,
        ) {
            let req = ReadRequest::new(1, FUNC_READ_HOLDING, 0, registers.len() as u16);
            let resp = encode_response(1, FUNC_READ_HOLDING, &registers).unwrap();
            let short = &resp[..resp.len() - cut];
            prop_assert_eq!(req.parse_response(short), Err(ProtocolError::LengthMismatch));
        }
    }
}
