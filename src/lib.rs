//! Sparse byte-addressable memory images and the Intel HEX format.
//!
//! [`Memory`] keeps a sorted, non-overlapping set of [`DataSegment`]s plus an
//! optional start address. It reads Intel HEX through [`Memory::parse`] and
//! writes it through [`Memory::dump`].

pub mod error;
pub mod io;
pub mod memory;
pub mod range;
pub mod segment;

pub use error::Error;
pub use io::{
    AddressMode, DecodeError, IntelHexWriteOptions, ParseError, ParseErrorKind, Record,
    decode_line, encode_line,
};
pub use memory::Memory;
pub use range::{Range, RangeError, parse_number};
pub use segment::DataSegment;
