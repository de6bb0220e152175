//! Mock address space for testing
//!
//! Provides a configurable in-memory implementation of the memory traits so
//! reading, writing, and scanning logic can be verified without a real
//! process. Ranges can be marked unreadable to model unmapped pages.

use std::cell::RefCell;
use std::ops::Range;

use crate::address::Address;
use crate::error::{Error, Result};
use crate::process::{ReadMemory, WriteMemory};
use crate::strings::{encode_c_string, encode_wide_string};

/// Mock address space backed by a host-local byte image.
#[derive(Debug)]
pub struct MockMemory {
    data: RefCell<Vec<u8>>,
    base: u64,
    gaps: Vec<Range<u64>>,
}

impl MockMemory {
    /// Create a mock with the given image at base address 0x1000.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: RefCell::new(data),
            base: 0x1000,
            gaps: Vec::new(),
        }
    }

    /// Create a mock with a custom base address.
    pub fn with_base(data: Vec<u8>, base: u64) -> Self {
        Self {
            data: RefCell::new(data),
            base,
            gaps: Vec::new(),
        }
    }

    pub fn base_address(&self) -> Address {
        Address::new(self.base)
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Validates a transfer and returns the image offset it starts at.
    fn check_range(&self, address: Address, len: usize) -> Result<usize> {
        let addr = address.get();
        if addr < self.base {
            return Err(Error::MemoryReadFailed {
                address: addr,
                message: format!("Address below base (base={:#x})", self.base),
            });
        }

        let offset = (addr - self.base) as usize;
        let image_len = self.data.borrow().len();
        if offset + len > image_len {
            return Err(Error::MemoryReadFailed {
                address: addr,
                message: format!(
                    "Out of bounds: offset={}, len={}, image={}",
                    offset, len, image_len
                ),
            });
        }

        let span = addr..addr + len as u64;
        for gap in &self.gaps {
            if span.start < gap.end && gap.start < span.end {
                return Err(Error::MemoryReadFailed {
                    address: addr,
                    message: format!("Range overlaps unreadable gap {:#x}..{:#x}", gap.start, gap.end),
                });
            }
        }

        Ok(offset)
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        let offset = self.check_range(address, len)?;
        Ok(self.data.borrow()[offset..offset + len].to_vec())
    }
}

impl WriteMemory for MockMemory {
    fn write_bytes(&self, address: Address, data: &[u8]) -> Result<()> {
        let offset = self.check_range(address, data.len()).map_err(|e| match e {
            Error::MemoryReadFailed { address, message } => {
                Error::MemoryWriteFailed { address, message }
            }
            other => other,
        })?;
        self.data.borrow_mut()[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// Builder for mock memory images.
///
/// Offsets are relative to the configured base address.
#[derive(Debug, Clone, Default)]
pub struct MockMemoryBuilder {
    data: Vec<u8>,
    base: u64,
    gaps: Vec<Range<u64>>,
}

impl MockMemoryBuilder {
    /// Create a builder with the default base address (0x1000).
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            base: 0x1000,
            gaps: Vec::new(),
        }
    }

    /// Set the base address.
    pub fn base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    /// Pre-allocate the image with zeros up to `size` bytes.
    pub fn with_size(mut self, size: usize) -> Self {
        if self.data.len() < size {
            self.data.resize(size, 0);
        }
        self
    }

    /// Mark `[offset, offset + len)` unreadable and unwritable.
    pub fn gap(mut self, offset: usize, len: usize) -> Self {
        self.gaps.push(offset as u64..(offset + len) as u64);
        self
    }

    pub fn write_i32(mut self, offset: usize, value: i32) -> Self {
        self.ensure_size(offset + 4);
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u32(mut self, offset: usize, value: u32) -> Self {
        self.ensure_size(offset + 4);
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i64(mut self, offset: usize, value: i64) -> Self {
        self.ensure_size(offset + 8);
        self.data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u64(mut self, offset: usize, value: u64) -> Self {
        self.ensure_size(offset + 8);
        self.data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.ensure_size(offset + bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Write a NUL-terminated narrow string at `offset`.
    pub fn write_c_string(self, offset: usize, text: &str) -> Self {
        let bytes = encode_c_string(text);
        self.write_bytes(offset, &bytes)
    }

    /// Write a NUL-terminated UTF-16LE string at `offset`.
    pub fn write_wide_string(self, offset: usize, text: &str) -> Self {
        let bytes = encode_wide_string(text);
        self.write_bytes(offset, &bytes)
    }

    pub fn build(self) -> MockMemory {
        let base = self.base;
        MockMemory {
            data: RefCell::new(self.data),
            base,
            gaps: self
                .gaps
                .into_iter()
                .map(|g| base + g.start..base + g.end)
                .collect(),
        }
    }

    fn ensure_size(&mut self, required: usize) {
        if self.data.len() < required {
            self.data.resize(required, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_basic() {
        let memory = MockMemory::new(vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(memory.read_i32(Address::new(0x1000)).unwrap(), 0x12345678);
    }

    #[test]
    fn test_mock_with_base() {
        let memory = MockMemory::with_base(vec![0x01, 0x02, 0x03, 0x04], 0x140000000);
        let bytes = memory.read_bytes(Address::new(0x140000000), 4).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_mock_below_base() {
        let memory = MockMemory::with_base(vec![0x01, 0x02], 0x2000);
        assert!(memory.read_bytes(Address::new(0x1000), 2).is_err());
    }

    #[test]
    fn test_mock_write() {
        let memory = MockMemory::new(vec![0u8; 8]);
        memory
            .write_bytes(Address::new(0x1002), &[0xAA, 0xBB])
            .unwrap();
        assert_eq!(
            memory.read_bytes(Address::new(0x1000), 4).unwrap(),
            vec![0, 0, 0xAA, 0xBB]
        );
    }

    #[test]
    fn test_mock_write_out_of_bounds() {
        let memory = MockMemory::new(vec![0u8; 4]);
        let err = memory
            .write_bytes(Address::new(0x1002), &[0; 4])
            .unwrap_err();
        assert!(matches!(err, Error::MemoryWriteFailed { .. }));
    }

    #[test]
    fn test_builder_values() {
        let memory = MockMemoryBuilder::new()
            .write_i32(0, 0x12345678)
            .write_u64(4, 0xDEADBEEFCAFEBABE)
            .build();

        assert_eq!(memory.read_i32(Address::new(0x1000)).unwrap(), 0x12345678);
        assert_eq!(
            memory.read_u64(Address::new(0x1004)).unwrap(),
            0xDEADBEEFCAFEBABE
        );
    }

    #[test]
    fn test_builder_strings() {
        let memory = MockMemoryBuilder::new()
            .with_size(64)
            .write_c_string(0, "narrow")
            .write_wide_string(16, "wide")
            .build();

        assert_eq!(
            memory.read_string(Address::new(0x1000), 16).unwrap(),
            "narrow"
        );
        assert_eq!(
            memory.read_wide_string(Address::new(0x1010), 8).unwrap(),
            "wide"
        );
    }

    #[test]
    fn test_gap_blocks_reads() {
        let memory = MockMemoryBuilder::new()
            .with_size(0x30)
            .gap(0x10, 0x10)
            .build();

        assert!(memory.read_bytes(Address::new(0x1000), 0x10).is_ok());
        assert!(memory.read_bytes(Address::new(0x1010), 1).is_err());
        assert!(memory.read_bytes(Address::new(0x100F), 2).is_err());
        assert!(memory.read_bytes(Address::new(0x1020), 0x10).is_ok());
    }
}
