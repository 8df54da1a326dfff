use std::fmt;

use thiserror::Error;

/// Coarse classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Syntax,
    Record,
    Data,
    Checksum,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseErrorKind::Syntax => "syntax error",
            ParseErrorKind::Record => "record error",
            ParseErrorKind::Data => "data error",
            ParseErrorKind::Checksum => "checksum error",
        };
        f.write_str(name)
    }
}

/// Failure while reading Intel HEX input or mutating a [`crate::Memory`].
///
/// Every variant carries the 1-indexed input line where it was detected.
/// Errors raised by direct calls such as [`crate::Memory::insert`] report
/// line 0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error: {message} at line {line}")]
    Syntax { line: usize, message: String },

    #[error("record error: {message} at line {line}")]
    Record { line: usize, message: String },

    #[error("data error: {message} at line {line}")]
    Data { line: usize, message: String },

    #[error(
        "checksum error: incorrect checksum (sum = {computed:02X} != {stored:02X}) at line {line}"
    )]
    Checksum {
        line: usize,
        computed: u8,
        stored: u8,
    },
}

impl ParseError {
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            ParseError::Syntax { .. } => ParseErrorKind::Syntax,
            ParseError::Record { .. } => ParseErrorKind::Record,
            ParseError::Data { .. } => ParseErrorKind::Data,
            ParseError::Checksum { .. } => ParseErrorKind::Checksum,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::Record { line, .. }
            | ParseError::Data { line, .. }
            | ParseError::Checksum { line, .. } => *line,
        }
    }

    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn data(line: usize, message: impl Into<String>) -> Self {
        ParseError::Data {
            line,
            message: message.into(),
        }
    }
}
