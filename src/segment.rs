/// One maximal contiguous run of known bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    pub address: u32,
    pub data: Vec<u8>,
}

impl DataSegment {
    pub fn new(address: u32, data: Vec<u8>) -> Self {
        debug_assert!(
            address as u64 + data.len() as u64 <= 1 << 32,
            "segment data exceeds the 32-bit address space"
        );
        Self { address, data }
    }

    /// Last covered address (inclusive).
    pub fn end_address(&self) -> u32 {
        if self.data.is_empty() {
            self.address
        } else {
            self.address + (self.data.len() - 1) as u32
        }
    }

    /// One past the last covered address. Widened so a segment ending at
    /// 0xFFFFFFFF stays representable.
    pub(crate) fn limit(&self) -> u64 {
        self.address as u64 + self.data.len() as u64
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.address && (addr as u64) < self.limit()
    }

    pub fn is_contiguous_with(&self, other: &DataSegment) -> bool {
        self.limit() == other.address as u64
    }
}
