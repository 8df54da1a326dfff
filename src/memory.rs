use crate::{DataSegment, ParseError, Range};

const ADDRESS_SPACE: u64 = 1 << 32;

/// Sparse byte-addressable memory image.
///
/// Segments are kept sorted by address, never overlap, and segments that
/// would touch are always coalesced into one. An optional start address is
/// carried independently of the data.
///
/// Parsing (see [`Memory::parse`]) resets the whole instance first. After a
/// failed parse the content is partial and should be cleared before reuse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    segments: Vec<DataSegment>,
    start_address: Option<u32>,
    pub(crate) extended_address: u32,
    pub(crate) eof_seen: bool,
    pub(crate) line_number: usize,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted, non-overlapping segments.
    pub fn segments(&self) -> &[DataSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<DataSegment> {
        self.segments
    }

    pub fn start_address(&self) -> Option<u32> {
        self.start_address
    }

    pub fn set_start_address(&mut self, address: u32) {
        self.start_address = Some(address);
    }

    /// Reset segments, start address and all parse bookkeeping.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of known bytes.
    pub fn len_bytes(&self) -> usize {
        self.segments.iter().map(DataSegment::len).sum()
    }

    pub fn min_address(&self) -> Option<u32> {
        self.segments.first().map(|s| s.address)
    }

    pub fn max_address(&self) -> Option<u32> {
        self.segments.last().map(DataSegment::end_address)
    }

    /// Read a single byte. Returns None if no segment covers `addr`.
    pub fn read_byte(&self, addr: u32) -> Option<u8> {
        let index = self.covering_index(addr)?;
        let seg = &self.segments[index];
        Some(seg.data[(addr - seg.address) as usize])
    }

    /// Add bytes that must not overlap any existing data.
    ///
    /// New bytes touching an existing segment are appended or prepended to
    /// it; bytes bridging two segments join them into one. On overlap the
    /// memory is left unchanged. Errors report line 0.
    pub fn insert(&mut self, address: u32, data: &[u8]) -> Result<(), ParseError> {
        self.insert_at_line(address, data, 0)
    }

    /// [`Memory::insert`] with errors tagged as coming from input `line`.
    pub(crate) fn insert_at_line(
        &mut self,
        address: u32,
        data: &[u8],
        line: usize,
    ) -> Result<(), ParseError> {
        if data.is_empty() {
            return Ok(());
        }
        let start = address as u64;
        let limit = checked_limit(address, data.len(), line)?;

        // First segment that ends after `start`; everything before ends at or
        // below it.
        let index = self.segments.partition_point(|s| s.limit() <= start);
        if let Some(next) = self.segments.get(index)
            && (next.address as u64) < limit
        {
            return Err(ParseError::data(line, "data segments overlap"));
        }

        let joins_prev = index > 0 && self.segments[index - 1].limit() == start;
        let joins_next = self
            .segments
            .get(index)
            .is_some_and(|s| s.address as u64 == limit);

        match (joins_prev, joins_next) {
            (true, true) => {
                let next = self.segments.remove(index);
                let prev = &mut self.segments[index - 1];
                prev.data.extend_from_slice(data);
                prev.data.extend(next.data);
            }
            (true, false) => {
                self.segments[index - 1].data.extend_from_slice(data);
            }
            (false, true) => {
                let next = &mut self.segments[index];
                let mut merged = Vec::with_capacity(data.len() + next.data.len());
                merged.extend_from_slice(data);
                merged.append(&mut next.data);
                next.data = merged;
                next.address = address;
            }
            (false, false) => {
                self.segments
                    .insert(index, DataSegment::new(address, data.to_vec()));
            }
        }
        Ok(())
    }

    /// Write bytes at their absolute addresses, replacing existing bytes in
    /// place and filling uncovered addresses as new data.
    pub fn overwrite(&mut self, address: u32, data: &[u8]) -> Result<(), ParseError> {
        if data.is_empty() {
            return Ok(());
        }
        checked_limit(address, data.len(), 0)?;

        for (offset, &byte) in data.iter().enumerate() {
            let addr = address + offset as u32;
            match self.covering_index(addr) {
                Some(index) => {
                    let seg = &mut self.segments[index];
                    let pos = (addr - seg.address) as usize;
                    seg.data[pos] = byte;
                }
                None => self.insert(addr, &[byte])?,
            }
        }
        Ok(())
    }

    /// Forget `length` bytes starting at `address`. Segments are trimmed or
    /// split as needed; uncovered addresses are ignored.
    pub fn delete(&mut self, address: u32, length: usize) {
        if length == 0 {
            return;
        }
        let start = address as u64;
        let limit = (start + length as u64).min(ADDRESS_SPACE);

        let first = self.segments.partition_point(|s| s.limit() <= start);
        let last = self.segments.partition_point(|s| (s.address as u64) < limit);
        if first >= last {
            return;
        }

        let mut kept = Vec::with_capacity(2);
        for seg in self.segments.drain(first..last) {
            if (seg.address as u64) < start {
                let end_offset = (start - seg.address as u64) as usize;
                kept.push(DataSegment::new(seg.address, seg.data[..end_offset].to_vec()));
            }
            if seg.limit() > limit {
                let start_offset = (limit - seg.address as u64) as usize;
                kept.push(DataSegment::new(
                    limit as u32,
                    seg.data[start_offset..].to_vec(),
                ));
            }
        }
        self.segments.splice(first..first, kept);
    }

    pub fn delete_range(&mut self, range: Range) {
        self.delete(range.start(), range.length() as usize);
    }

    /// Exactly `length` bytes starting at `address`, with `pad` wherever no
    /// segment covers an address. Addresses past 0xFFFFFFFF read as `pad`.
    pub fn extract(&self, address: u32, length: usize, pad: u8) -> Vec<u8> {
        let mut out = vec![pad; length];
        let start = address as u64;
        let limit = start + length as u64;

        let first = self.segments.partition_point(|s| s.limit() <= start);
        for seg in &self.segments[first..] {
            let seg_start = seg.address as u64;
            if seg_start >= limit {
                break;
            }
            let from = seg_start.max(start);
            let to = seg.limit().min(limit);
            let src = &seg.data[(from - seg_start) as usize..(to - seg_start) as usize];
            out[(from - start) as usize..(to - start) as usize].copy_from_slice(src);
        }
        out
    }

    pub fn extract_range(&self, range: Range, pad: u8) -> Vec<u8> {
        self.extract(range.start(), range.length() as usize, pad)
    }

    fn covering_index(&self, addr: u32) -> Option<usize> {
        let index = self.segments.partition_point(|s| s.limit() <= addr as u64);
        self.segments
            .get(index)
            .filter(|s| s.contains(addr))
            .map(|_| index)
    }
}

fn checked_limit(address: u32, len: usize, line: usize) -> Result<u64, ParseError> {
    let limit = address as u64 + len as u64;
    if limit > ADDRESS_SPACE {
        return Err(ParseError::data(
            line,
            format!("data at {address:#X} exceeds the 32-bit address space"),
        ));
    }
    Ok(limit)
}
