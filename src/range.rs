use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid range format: {0}")]
    InvalidFormat(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("range start ({start:#X}) exceeds end ({end:#X})")]
    StartExceedsEnd { start: u32, end: u32 },

    #[error("zero length range at {start:#X}")]
    ZeroLength { start: u32 },

    #[error("range at {start:#X} with length {length:#X} runs past 0xFFFFFFFF")]
    Overflow { start: u32, length: u32 },
}

/// Non-empty address range with an inclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: u32,
    end: u32,
}

impl Range {
    pub fn from_start_length(start: u32, length: u32) -> Result<Self, RangeError> {
        if length == 0 {
            return Err(RangeError::ZeroLength { start });
        }
        let end = start
            .checked_add(length - 1)
            .ok_or(RangeError::Overflow { start, length })?;
        Ok(Self { start, end })
    }

    pub fn from_start_end(start: u32, end: u32) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::StartExceedsEnd { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of addresses covered; 1 << 32 for the full address space.
    pub fn length(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    pub fn contains(&self, addr: u32) -> bool {
        (self.start..=self.end).contains(&addr)
    }
}

/// Parse an address or length: decimal, `0x` hex or `0b` binary.
pub fn parse_number(s: &str) -> Result<u32, RangeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(RangeError::InvalidNumber("empty string".to_string()));
    }

    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (2, bin)
    } else {
        (10, s)
    };

    u32::from_str_radix(digits, radix).map_err(|e| RangeError::InvalidNumber(format!("{s}: {e}")))
}

impl FromStr for Range {
    type Err = RangeError;

    /// Accepts `start,length` or `start-end`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((start, length)) = s.split_once(',') {
            Range::from_start_length(parse_number(start)?, parse_number(length)?)
        } else if let Some((start, end)) = s.split_once('-') {
            Range::from_start_end(parse_number(start)?, parse_number(end)?)
        } else {
            Err(RangeError::InvalidFormat(format!(
                "expected 'start,length' or 'start-end', got '{s}'"
            )))
        }
    }
}
