mod error;
mod intel_hex;
mod record;

pub use error::{ParseError, ParseErrorKind};
pub use intel_hex::{AddressMode, IntelHexWriteOptions};
pub use record::{
    DecodeError, RECORD_DATA, RECORD_EOF, RECORD_EXTENDED_LINEAR, RECORD_EXTENDED_SEGMENT,
    RECORD_START_LINEAR, Record, decode_line, encode_line,
};
