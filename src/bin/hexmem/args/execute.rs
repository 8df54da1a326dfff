use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hexmem::{Memory, Range};
use log::info;

use super::error::CliError;
use super::types::{Args, Command};

const CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// Bytes materialized at a time when writing an extracted range.
const EXTRACT_CHUNK: u64 = 0x1_0000;

fn load_hex(path: &Path) -> Result<Memory, CliError> {
    let file = File::open(path)?;
    let mut memory = Memory::new();
    memory.parse(file).map_err(|source| CliError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(memory)
}

impl Args {
    pub fn execute(&self, out: &mut impl Write) -> Result<(), CliError> {
        match &self.command {
            Command::Info { input } => {
                let memory = load_hex(input)?;
                write_info(&memory, out)?;
            }
            Command::Extract {
                input,
                range,
                output,
                pad,
            } => {
                let memory = load_hex(input)?;
                let mut file = BufWriter::new(File::create(output)?);
                write_extracted(&memory, *range, *pad, &mut file)?;
                file.flush()?;
                info!(
                    "extracted {} bytes at {:#010X} to {}",
                    range.length(),
                    range.start(),
                    output.display()
                );
            }
            Command::Reformat {
                input,
                output,
                options,
            } => {
                let memory = load_hex(input)?;
                memory.dump_with_options(File::create(output)?, options)?;
            }
            Command::FromBin {
                input,
                address,
                output,
                start,
                options,
            } => {
                let data = std::fs::read(input)?;
                let mut memory = Memory::new();
                memory
                    .insert(*address, &data)
                    .map_err(|source| CliError::Parse {
                        path: input.display().to_string(),
                        source,
                    })?;
                if let Some(start) = start {
                    memory.set_start_address(*start);
                }
                memory.dump_with_options(File::create(output)?, options)?;
            }
        }
        Ok(())
    }
}

/// Stream `range` to `out`, padding gaps, without holding it all in memory.
fn write_extracted(
    memory: &Memory,
    range: Range,
    pad: u8,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let end = range.end() as u64 + 1;
    let mut address = range.start() as u64;
    while address < end {
        let len = EXTRACT_CHUNK.min(end - address);
        out.write_all(&memory.extract(address as u32, len as usize, pad))?;
        address += len;
    }
    Ok(())
}

fn write_info(memory: &Memory, out: &mut impl Write) -> std::io::Result<()> {
    match memory.start_address() {
        Some(start) => writeln!(out, "start address: {start:#010X}")?,
        None => writeln!(out, "start address: none")?,
    }
    writeln!(out, "segments: {}", memory.segments().len())?;
    for segment in memory.segments() {
        writeln!(
            out,
            "  {:#010X}-{:#010X}  {:>8} bytes  crc32 {:08X}",
            segment.address,
            segment.end_address(),
            segment.len(),
            CRC32.checksum(&segment.data)
        )?;
    }
    writeln!(out, "total: {} bytes", memory.len_bytes())
}
