//! Single-line Intel HEX record codec.
//!
//! A record line is `:BBAAAARRDD..DDCC`: byte count, 16-bit big-endian
//! address, record type, payload and a two's complement checksum over all
//! preceding bytes.

use thiserror::Error;

use super::ParseError;

pub const RECORD_DATA: u8 = 0x00;
pub const RECORD_EOF: u8 = 0x01;
pub const RECORD_EXTENDED_SEGMENT: u8 = 0x02;
pub const RECORD_EXTENDED_LINEAR: u8 = 0x04;
pub const RECORD_START_LINEAR: u8 = 0x05;

const SEGMENT_SHIFT: u32 = 4;
const LINEAR_SHIFT: u32 = 16;

/// Byte count, two address bytes, record type and checksum.
const RECORD_OVERHEAD: usize = 5;

/// A decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Data { address: u16, data: Vec<u8> },
    EndOfFile,
    /// Type 02. Holds the base address, already shifted left by 4.
    ExtendedSegmentAddress(u32),
    /// Type 04. Holds the base address, already shifted left by 16.
    ExtendedLinearAddress(u32),
    StartLinearAddress(u32),
    /// Structurally valid record of a type this codec does not interpret.
    /// Fields are kept so the record re-encodes to the same line.
    Unsupported {
        record_type: u8,
        address: u16,
        data: Vec<u8>,
    },
}

/// Line-independent decode failure. The parser attaches the line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("no colon char on the first line character")]
    MissingColon,

    #[error("invalid hex digit '{0}'")]
    InvalidHexDigit(char),

    #[error("odd number of hex digits")]
    OddLength,

    #[error("not enough data bytes")]
    TooShort,

    #[error("incorrect data length (byte count {declared}, payload {actual})")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("incorrect checksum (sum = {computed:02X} != {stored:02X})")]
    Checksum { computed: u8, stored: u8 },

    #[error("{0}")]
    InvalidField(&'static str),
}

impl DecodeError {
    /// Attach the input line number, classifying the failure.
    pub fn at_line(self, line: usize) -> ParseError {
        match self {
            DecodeError::MissingColon
            | DecodeError::InvalidHexDigit(_)
            | DecodeError::OddLength => ParseError::syntax(line, self.to_string()),
            DecodeError::TooShort | DecodeError::LengthMismatch { .. } => {
                ParseError::data(line, self.to_string())
            }
            DecodeError::Checksum { computed, stored } => ParseError::Checksum {
                line,
                computed,
                stored,
            },
            DecodeError::InvalidField(message) => ParseError::Record {
                line,
                message: message.to_string(),
            },
        }
    }
}

impl Record {
    /// Render this record as a line (without terminator).
    pub fn encode(&self) -> String {
        match self {
            Record::Data { address, data } => {
                encode_line(data.len() as u8, *address, RECORD_DATA, data)
            }
            Record::EndOfFile => encode_line(0, 0, RECORD_EOF, &[]),
            Record::ExtendedSegmentAddress(base) => {
                let value = (*base >> SEGMENT_SHIFT) as u16;
                encode_line(2, 0, RECORD_EXTENDED_SEGMENT, &value.to_be_bytes())
            }
            Record::ExtendedLinearAddress(base) => {
                let value = (*base >> LINEAR_SHIFT) as u16;
                encode_line(2, 0, RECORD_EXTENDED_LINEAR, &value.to_be_bytes())
            }
            Record::StartLinearAddress(addr) => {
                encode_line(4, 0, RECORD_START_LINEAR, &addr.to_be_bytes())
            }
            Record::Unsupported {
                record_type,
                address,
                data,
            } => encode_line(data.len() as u8, *address, *record_type, data),
        }
    }
}

/// Decode one non-empty line into a typed record.
///
/// Generic checks run in order: leading colon, hex digits, minimum size,
/// checksum, declared length. Type-specific field checks follow for EOF,
/// extended address and start address records.
pub fn decode_line(text: &str) -> Result<Record, DecodeError> {
    let hex_str = text.strip_prefix(':').ok_or(DecodeError::MissingColon)?;
    let bytes = parse_hex_bytes(hex_str)?;

    if bytes.len() < RECORD_OVERHEAD {
        return Err(DecodeError::TooShort);
    }

    let (body, stored) = bytes.split_at(bytes.len() - 1);
    let computed = checksum(body);
    if computed != stored[0] {
        return Err(DecodeError::Checksum {
            computed,
            stored: stored[0],
        });
    }

    let byte_count = bytes[0] as usize;
    if byte_count + RECORD_OVERHEAD != bytes.len() {
        return Err(DecodeError::LengthMismatch {
            declared: byte_count,
            actual: bytes.len() - RECORD_OVERHEAD,
        });
    }

    let address = u16::from_be_bytes([bytes[1], bytes[2]]);
    let record_type = bytes[3];
    let payload = &bytes[4..4 + byte_count];

    match record_type {
        RECORD_DATA => Ok(Record::Data {
            address,
            data: payload.to_vec(),
        }),
        RECORD_EOF => {
            if byte_count != 0 {
                return Err(DecodeError::InvalidField(
                    "incorrect data length field in eof line",
                ));
            }
            if address != 0 {
                return Err(DecodeError::InvalidField(
                    "incorrect address field in eof line",
                ));
            }
            Ok(Record::EndOfFile)
        }
        RECORD_EXTENDED_SEGMENT => {
            extended_base(address, payload, SEGMENT_SHIFT).map(Record::ExtendedSegmentAddress)
        }
        RECORD_EXTENDED_LINEAR => {
            extended_base(address, payload, LINEAR_SHIFT).map(Record::ExtendedLinearAddress)
        }
        RECORD_START_LINEAR => {
            if byte_count != 4 {
                return Err(DecodeError::InvalidField(
                    "incorrect data length field in start address line",
                ));
            }
            if address != 0 {
                return Err(DecodeError::InvalidField(
                    "incorrect address field in start address line",
                ));
            }
            let value = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
            Ok(Record::StartLinearAddress(value))
        }
        _ => Ok(Record::Unsupported {
            record_type,
            address,
            data: payload.to_vec(),
        }),
    }
}

/// Build a record line: fields, computed checksum, uppercase hex, `:` prefix.
pub fn encode_line(byte_count: u8, address: u16, record_type: u8, payload: &[u8]) -> String {
    debug_assert!(payload.len() <= u8::MAX as usize);
    let addr_bytes = address.to_be_bytes();
    let header = [byte_count, addr_bytes[0], addr_bytes[1], record_type];

    let payload_sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    let sum = checksum(&header).wrapping_sub(payload_sum);

    let mut line = String::with_capacity(1 + 2 * (header.len() + payload.len() + 1));
    line.push(':');
    for &b in header.iter().chain(payload).chain(std::iter::once(&sum)) {
        push_hex_byte(&mut line, b);
    }
    line
}

/// Two's complement of the byte sum, mod 256.
fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0u8.wrapping_sub(sum)
}

fn extended_base(address: u16, payload: &[u8], shift: u32) -> Result<u32, DecodeError> {
    if payload.len() != 2 {
        return Err(DecodeError::InvalidField(
            "incorrect data length field in extended address line",
        ));
    }
    if address != 0 {
        return Err(DecodeError::InvalidField(
            "incorrect address field in extended address line",
        ));
    }
    let value = u16::from_be_bytes([payload[0], payload[1]]);
    Ok((value as u32) << shift)
}

fn push_hex_byte(output: &mut String, byte: u8) {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
    output.push(HEX_CHARS[(byte >> 4) as usize] as char);
    output.push(HEX_CHARS[(byte & 0x0F) as usize] as char);
}

fn parse_hex_bytes(hex_str: &str) -> Result<Vec<u8>, DecodeError> {
    let bytes = hex_str.as_bytes();
    if !bytes.len().is_multiple_of(2) {
        return Err(DecodeError::OddLength);
    }

    let mut out = Vec::with_capacity(bytes.len() / 2);
    for chunk in bytes.chunks_exact(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        out.push((high << 4) | low);
    }

    Ok(out)
}

fn hex_digit(b: u8) -> Result<u8, DecodeError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(DecodeError::InvalidHexDigit(b as char)),
    }
}
