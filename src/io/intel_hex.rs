use std::io::{BufRead, BufReader, BufWriter, Read, Write};

use log::{debug, trace, warn};

use super::ParseError;
use super::record::{RECORD_DATA, Record, decode_line, encode_line};
use crate::{Error, Memory};

const BANK_SIZE: usize = 0x10000;
/// Highest 64 KiB bank reachable through type 02 records.
const MAX_SEGMENT_BANK: u32 = 0xF;

/// Which extended-address record the dumper emits at 64 KiB boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Type 04 records; covers the full 32-bit space.
    #[default]
    ExtendedLinear,
    /// Type 02 records; covers the first 1 MiB.
    ExtendedSegment,
}

#[derive(Debug, Clone)]
pub struct IntelHexWriteOptions {
    /// Maximum payload per data record. 0 falls back to 16.
    pub bytes_per_line: u8,
    pub mode: AddressMode,
}

impl Default for IntelHexWriteOptions {
    fn default() -> Self {
        Self {
            bytes_per_line: 16,
            mode: AddressMode::ExtendedLinear,
        }
    }
}

impl Memory {
    /// Parse Intel HEX input into a fresh memory.
    pub fn from_intel_hex(input: &[u8]) -> Result<Memory, ParseError> {
        let mut memory = Memory::new();
        memory.parse(input)?;
        Ok(memory)
    }

    /// Replace the content of this memory with parsed Intel HEX input.
    ///
    /// The first failing line aborts the parse; the memory then holds
    /// whatever was accepted before it. Lines after the EOF record are not
    /// read.
    pub fn parse<R: Read>(&mut self, source: R) -> Result<(), ParseError> {
        self.clear();

        for line in BufReader::new(source).lines() {
            self.line_number += 1;
            let line = line.map_err(|e| ParseError::syntax(self.line_number, e.to_string()))?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            let record = decode_line(line).map_err(|e| e.at_line(self.line_number))?;
            trace!("line {}: {:?}", self.line_number, record);

            match record {
                Record::Data { address, data } => {
                    let address = self.extended_address + address as u32;
                    self.insert_at_line(address, &data, self.line_number)?;
                }
                Record::EndOfFile => {
                    self.eof_seen = true;
                    break;
                }
                Record::ExtendedSegmentAddress(base) | Record::ExtendedLinearAddress(base) => {
                    self.extended_address = base;
                }
                Record::StartLinearAddress(address) => {
                    if self.start_address().is_some() {
                        return Err(ParseError::data(
                            self.line_number,
                            "multiple start address lines",
                        ));
                    }
                    self.set_start_address(address);
                }
                Record::Unsupported { record_type, .. } => {
                    warn!(
                        "skipping unsupported record type {record_type:02X} at line {}",
                        self.line_number
                    );
                }
            }
        }

        if !self.eof_seen {
            return Err(ParseError::data(self.line_number, "no end of file line"));
        }

        debug!(
            "parsed {} lines into {} segments ({} bytes)",
            self.line_number,
            self.segments().len(),
            self.len_bytes()
        );
        Ok(())
    }

    /// Write this memory as Intel HEX with extended linear addressing.
    pub fn dump<W: Write>(&self, sink: W, line_length: u8) -> Result<(), Error> {
        self.dump_with_options(
            sink,
            &IntelHexWriteOptions {
                bytes_per_line: line_length,
                ..Default::default()
            },
        )
    }

    /// Write this memory as Intel HEX.
    ///
    /// Output order: start address record (if set), then each segment in
    /// address order with an extended-address record whenever the 64 KiB
    /// bank changes, then the EOF record. Data records never cross a bank.
    pub fn dump_with_options<W: Write>(
        &self,
        sink: W,
        options: &IntelHexWriteOptions,
    ) -> Result<(), Error> {
        let bytes_per_line = if options.bytes_per_line == 0 {
            16
        } else {
            options.bytes_per_line
        } as usize;

        let mut out = BufWriter::new(sink);
        let mut records = 0usize;

        if let Some(start) = self.start_address() {
            writeln!(out, "{}", Record::StartLinearAddress(start).encode())?;
            records += 1;
        }

        let mut current_bank: Option<u32> = None;

        for segment in self.segments() {
            let mut addr = segment.address;
            let mut offset = 0;

            while offset < segment.len() {
                let bank = addr >> 16;
                if current_bank != Some(bank) {
                    writeln!(out, "{}", bank_record(bank, addr, options.mode)?.encode())?;
                    records += 1;
                    current_bank = Some(bank);
                }

                let offset_addr = (addr & 0xFFFF) as u16;
                let remaining_in_bank = BANK_SIZE - offset_addr as usize;
                let chunk_len = bytes_per_line
                    .min(remaining_in_bank)
                    .min(segment.len() - offset);
                let chunk = &segment.data[offset..offset + chunk_len];
                writeln!(
                    out,
                    "{}",
                    encode_line(chunk_len as u8, offset_addr, RECORD_DATA, chunk)
                )?;
                records += 1;

                offset += chunk_len;
                addr = addr.wrapping_add(chunk_len as u32);
            }
        }

        writeln!(out, "{}", Record::EndOfFile.encode())?;
        out.flush()?;

        debug!(
            "dumped {} segments as {} records",
            self.segments().len(),
            records + 1
        );
        Ok(())
    }

    /// Render as Intel HEX into a byte buffer.
    pub fn to_intel_hex(&self, options: &IntelHexWriteOptions) -> Result<Vec<u8>, Error> {
        let mut output = Vec::new();
        self.dump_with_options(&mut output, options)?;
        Ok(output)
    }
}

fn bank_record(bank: u32, addr: u32, mode: AddressMode) -> Result<Record, Error> {
    match mode {
        AddressMode::ExtendedLinear => Ok(Record::ExtendedLinearAddress(bank << 16)),
        AddressMode::ExtendedSegment if bank <= MAX_SEGMENT_BANK => {
            Ok(Record::ExtendedSegmentAddress(bank << 16))
        }
        AddressMode::ExtendedSegment => Err(Error::AddressOutOfRange { address: addr }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataSegment, ParseErrorKind};

    fn parse(text: &str) -> Result<Memory, ParseError> {
        Memory::from_intel_hex(text.as_bytes())
    }

    fn dump(memory: &Memory, line_length: u8) -> String {
        let mut out = Vec::new();
        memory.dump(&mut out, line_length).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let m = parse(":10010000214601360121470136007EFE09D2190140\n:00000001FF\n").unwrap();
        assert_eq!(
            m.segments(),
            &[DataSegment::new(
                0x0100,
                vec![
                    0x21, 0x46, 0x01, 0x36, 0x01, 0x21, 0x47, 0x01, 0x36, 0x00, 0x7E, 0xFE, 0x09,
                    0xD2, 0x19, 0x01
                ]
            )]
        );
        assert_eq!(m.start_address(), None);
    }

    #[test]
    fn test_parse_address_records() {
        let m = parse(":020000041234B4\n:0400000501020304ED\n:00000001FF\n").unwrap();
        assert_eq!(m.line_number, 3);
        assert_eq!(m.extended_address, 0x1234_0000);
        assert_eq!(m.start_address(), Some(0x01020304));
        assert!(m.eof_seen);
        assert!(m.is_empty());

        let m = parse(":020000041234B4\n:02000004234592\n:00000001FF\n").unwrap();
        assert_eq!(m.extended_address, 0x2345_0000);
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let m = parse(
            ":048000000102030472\r\n\r\n:04800400050607085E\r\n:00000001FF\r\n",
        )
        .unwrap();
        assert_eq!(
            m.segments(),
            &[DataSegment::new(0x8000, vec![1, 2, 3, 4, 5, 6, 7, 8])]
        );
    }

    #[test]
    fn test_parse_error_line_numbers() {
        let err = parse(":048000000102030472\n\n:00000001FE\n").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::Checksum);
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_insert_after_parse_reports_line_zero() {
        let mut m = Memory::from_intel_hex(b":0100000001FE\n\n\n:00000001FF\n").unwrap();
        assert_eq!(m.line_number, 4);

        let err = m.insert(0, &[9]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::Data);
        assert_eq!(err.line(), 0);

        let err = m.overwrite(u32::MAX, &[1, 2]).unwrap_err();
        assert_eq!(err.line(), 0);
        assert_eq!(m.segments(), &[DataSegment::new(0, vec![1])]);
    }

    #[test]
    fn test_parse_overlap_reports_input_line() {
        let err = parse(":0100000001FE\n\n:0100000002FD\n:00000001FF\n").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::Data);
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_parse_file_level_errors() {
        for (input, kind) in [
            ("\n", ParseErrorKind::Data),
            (":000000FF01\n", ParseErrorKind::Data),
            (":0400000501000000F6\n", ParseErrorKind::Data),
            (
                ":0400000501000000F6\n:0400000502000000F5\n:00000001FF\n",
                ParseErrorKind::Data,
            ),
            (
                ":048000000102030472\n:04800300050607085F\n:00000001FF\n",
                ParseErrorKind::Data,
            ),
            (
                ":048000000102030472\n:047FFD000506070866\n:00000001FF\n",
                ParseErrorKind::Data,
            ),
        ] {
            assert_eq!(parse(input).unwrap_err().kind(), kind, "{input:?}");
        }
    }

    #[test]
    fn test_parse_invalid_utf8_is_syntax_error() {
        let err = Memory::from_intel_hex(b":00000001FF\xFF\xFE\n").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_parse_stops_at_eof_record() {
        let m = parse(":0100000001FE\n:00000001FF\ntrailing garbage\n").unwrap();
        assert_eq!(m.segments(), &[DataSegment::new(0, vec![1])]);
    }

    #[test]
    fn test_parse_resets_previous_content() {
        let mut m = Memory::new();
        m.set_start_address(0x1234_5678);
        m.insert(0x10, &[1, 2]).unwrap();
        m.parse(":020000049ABCA4\n:048000000102030472\n:00000001FF\n".as_bytes())
            .unwrap();
        assert_eq!(m.start_address(), None);
        assert_eq!(
            m.segments(),
            &[DataSegment::new(0x9ABC_8000, vec![1, 2, 3, 4])]
        );
    }

    #[test]
    fn test_dump_single_bank() {
        let mut m = Memory::new();
        m.set_start_address(0x12345678);
        m.insert(0x0, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]).unwrap();
        assert_eq!(
            dump(&m, 16),
            ":0400000512345678E3\n\
             :020000040000FA\n\
             :0C0000000102030405060708090A0B0CA6\n\
             :00000001FF\n"
        );
    }

    #[test]
    fn test_dump_empty() {
        assert_eq!(dump(&Memory::new(), 16), ":00000001FF\n");
    }

    #[test]
    fn test_dump_crosses_bank() {
        let mut m = Memory::new();
        m.insert(0xFFFE, &[0xA0, 0xA1, 0xA2, 0xA3]).unwrap();
        assert_eq!(
            dump(&m, 16),
            ":020000040000FA\n\
             :02FFFE00A0A1C0\n\
             :020000040001F9\n\
             :02000000A2A3B9\n\
             :00000001FF\n"
        );
    }

    #[test]
    fn test_dump_zero_line_length_falls_back() {
        let mut m = Memory::new();
        m.insert(0, &[0; 20]).unwrap();
        let text = dump(&m, 0);
        assert!(text.contains(":10000000"));
        assert!(text.contains(":04001000"));
    }

    #[test]
    fn test_dump_extended_segment_mode() {
        let mut m = Memory::new();
        m.insert(0x38000, &[1, 2, 3, 4]).unwrap();
        let options = IntelHexWriteOptions {
            mode: AddressMode::ExtendedSegment,
            ..Default::default()
        };
        let text = String::from_utf8(m.to_intel_hex(&options).unwrap()).unwrap();
        assert_eq!(
            text,
            ":020000023000CC\n:048000000102030472\n:00000001FF\n"
        );
        assert_eq!(Memory::from_intel_hex(text.as_bytes()).unwrap().segments(), m.segments());
    }

    #[test]
    fn test_dump_extended_segment_out_of_range() {
        let mut m = Memory::new();
        m.insert(0x10_0000, &[1]).unwrap();
        let options = IntelHexWriteOptions {
            mode: AddressMode::ExtendedSegment,
            ..Default::default()
        };
        assert!(matches!(
            m.to_intel_hex(&options),
            Err(Error::AddressOutOfRange {
                address: 0x10_0000
            })
        ));
    }
}
