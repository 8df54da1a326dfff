use std::path::PathBuf;

use hexmem::{AddressMode, IntelHexWriteOptions, Range, parse_number};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseArgError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("invalid range: {0}")]
    InvalidRange(String),
}

#[derive(Debug)]
pub enum Command {
    Info {
        input: PathBuf,
    },
    Extract {
        input: PathBuf,
        range: Range,
        output: PathBuf,
        pad: u8,
    },
    Reformat {
        input: PathBuf,
        output: PathBuf,
        options: IntelHexWriteOptions,
    },
    FromBin {
        input: PathBuf,
        address: u32,
        output: PathBuf,
        start: Option<u32>,
        options: IntelHexWriteOptions,
    },
}

#[derive(Debug)]
pub struct Args {
    pub command: Command,
}

/// Flags accepted by every command; commands ignore the ones they do not use.
#[derive(Debug, Default)]
struct Flags {
    output: Option<PathBuf>,
    pad: Option<u8>,
    start: Option<u32>,
    line_length: Option<u8>,
    segment: bool,
}

impl Flags {
    fn write_options(&self) -> IntelHexWriteOptions {
        let defaults = IntelHexWriteOptions::default();
        IntelHexWriteOptions {
            bytes_per_line: self.line_length.unwrap_or(defaults.bytes_per_line),
            mode: if self.segment {
                AddressMode::ExtendedSegment
            } else {
                AddressMode::ExtendedLinear
            },
        }
    }
}

impl Args {
    pub fn parse() -> Result<Self, ParseArgError> {
        Self::parse_from(std::env::args().skip(1).collect())
    }

    pub fn parse_from(args: Vec<String>) -> Result<Self, ParseArgError> {
        let mut iter = args.into_iter();
        let command = iter.next().ok_or(ParseArgError::MissingCommand)?;

        let mut positional = Vec::new();
        let mut flags = Flags::default();
        while let Some(arg) = iter.next() {
            if !arg.starts_with('-') {
                positional.push(arg);
                continue;
            }
            if arg == "--segment" {
                flags.segment = true;
                continue;
            }
            let value = iter
                .next()
                .ok_or_else(|| ParseArgError::MissingValue(arg.clone()))?;
            match arg.as_str() {
                "-o" | "--output" => flags.output = Some(PathBuf::from(value)),
                "--pad" => flags.pad = Some(parse_u8(&value)?),
                "--start" => flags.start = Some(parse_u32(&value)?),
                "--line-length" => flags.line_length = Some(parse_u8(&value)?),
                _ => return Err(ParseArgError::InvalidOption(arg)),
            }
        }

        let mut positional = positional.into_iter();
        let mut next = |name: &'static str| {
            positional
                .next()
                .ok_or(ParseArgError::MissingArgument(name))
        };

        let command = match command.as_str() {
            "info" => Command::Info {
                input: next("input file")?.into(),
            },
            "extract" => {
                let input = next("input file")?.into();
                let range = next("range")?
                    .parse::<Range>()
                    .map_err(|e| ParseArgError::InvalidRange(e.to_string()))?;
                Command::Extract {
                    input,
                    range,
                    output: flags
                        .output
                        .take()
                        .ok_or(ParseArgError::MissingArgument("-o <output>"))?,
                    pad: flags.pad.unwrap_or(0xFF),
                }
            }
            "reformat" => Command::Reformat {
                input: next("input file")?.into(),
                output: next("output file")?.into(),
                options: flags.write_options(),
            },
            "from-bin" => Command::FromBin {
                input: next("input file")?.into(),
                address: parse_u32(&next("address")?)?,
                output: next("output file")?.into(),
                start: flags.start,
                options: flags.write_options(),
            },
            _ => return Err(ParseArgError::UnknownCommand(command)),
        };

        if let Some(extra) = positional.next() {
            return Err(ParseArgError::UnexpectedArgument(extra));
        }

        Ok(Args { command })
    }
}

fn parse_u32(s: &str) -> Result<u32, ParseArgError> {
    parse_number(s).map_err(|e| ParseArgError::InvalidNumber(e.to_string()))
}

fn parse_u8(s: &str) -> Result<u8, ParseArgError> {
    let value = parse_u32(s)?;
    u8::try_from(value)
        .map_err(|_| ParseArgError::InvalidNumber(format!("{s} does not fit in a byte")))
}
