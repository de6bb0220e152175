#![cfg_attr(not(target_os = "windows"), allow(dead_code, unused_variables))]

//! Typed access to a foreign address space.
//!
//! `ReadMemory`/`WriteMemory` define the width-exact operations over a raw
//! byte transfer; `ProcessMemory` is the live implementation for an attached
//! process. Every transfer is all-or-nothing: a short read or write is an
//! error, never silently partial, so a caller can always distinguish "the
//! value is zero" from "the read failed".

use crate::address::Address;
use crate::buffer::{BufferHandle, BufferPool};
use crate::error::{Error, Result};
use crate::process::ProcessHandle;
use crate::strings::{
    decode_c_string, decode_wide_string, encode_c_string, encode_wide_string,
};

#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
#[cfg(target_os = "windows")]
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_GUARD, PAGE_NOACCESS, VirtualQueryEx,
};

/// Page granularity used by the page-checked transfer path.
pub const PAGE_SIZE: u64 = 0x1000;

/// Trait for reading a foreign or mock address space.
///
/// Implementors provide `read_bytes`; the typed operations are derived from
/// it. All multi-byte values are little-endian.
pub trait ReadMemory {
    /// Read exactly `len` raw bytes at `address`.
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>>;

    fn read_u8(&self, address: Address) -> Result<u8> {
        let bytes = self.read_bytes(address, 1)?;
        Ok(bytes[0])
    }

    fn read_i8(&self, address: Address) -> Result<i8> {
        Ok(self.read_u8(address)? as i8)
    }

    fn read_u16(&self, address: Address) -> Result<u16> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_i16(&self, address: Address) -> Result<i16> {
        Ok(self.read_u16(address)? as i16)
    }

    fn read_u32(&self, address: Address) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&self, address: Address) -> Result<i32> {
        Ok(self.read_u32(address)? as i32)
    }

    fn read_u64(&self, address: Address) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_i64(&self, address: Address) -> Result<i64> {
        Ok(self.read_u64(address)? as i64)
    }

    fn read_f32(&self, address: Address) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(address)?))
    }

    fn read_f64(&self, address: Address) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64(address)?))
    }

    /// Read a foreign pointer-sized value as an [`Address`].
    fn read_address(&self, address: Address) -> Result<Address> {
        Ok(Address::new(self.read_u64(address)?))
    }

    /// Read a narrow string, stopping at NUL or after `max_len` bytes.
    fn read_string(&self, address: Address, max_len: usize) -> Result<String> {
        let bytes = self.read_bytes(address, max_len)?;
        Ok(decode_c_string(&bytes))
    }

    /// Read a UTF-16 string, stopping at NUL or after `max_units` code units.
    fn read_wide_string(&self, address: Address, max_units: usize) -> Result<String> {
        let bytes = self.read_bytes(address, max_units * 2)?;
        Ok(decode_wide_string(&bytes))
    }

    /// Read `len` foreign bytes into the start of a staging buffer.
    fn read_to_buffer(
        &self,
        address: Address,
        pool: &mut BufferPool,
        handle: BufferHandle,
        len: usize,
    ) -> Result<()> {
        let size = pool.size_of(handle)?;
        if len > size {
            return Err(Error::OutOfBounds {
                offset: 0,
                len,
                size,
            });
        }
        let data = self.read_bytes(address, len)?;
        pool.bytes_mut(handle)?[..len].copy_from_slice(&data);
        Ok(())
    }
}

/// Trait for writing a foreign or mock address space.
pub trait WriteMemory {
    /// Write all of `data` at `address`.
    fn write_bytes(&self, address: Address, data: &[u8]) -> Result<()>;

    fn write_u8(&self, address: Address, value: u8) -> Result<()> {
        self.write_bytes(address, &[value])
    }

    fn write_i8(&self, address: Address, value: i8) -> Result<()> {
        self.write_u8(address, value as u8)
    }

    fn write_u16(&self, address: Address, value: u16) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    fn write_i16(&self, address: Address, value: i16) -> Result<()> {
        self.write_u16(address, value as u16)
    }

    fn write_u32(&self, address: Address, value: u32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    fn write_i32(&self, address: Address, value: i32) -> Result<()> {
        self.write_u32(address, value as u32)
    }

    fn write_u64(&self, address: Address, value: u64) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    fn write_i64(&self, address: Address, value: i64) -> Result<()> {
        self.write_u64(address, value as u64)
    }

    fn write_f32(&self, address: Address, value: f32) -> Result<()> {
        self.write_u32(address, value.to_bits())
    }

    fn write_f64(&self, address: Address, value: f64) -> Result<()> {
        self.write_u64(address, value.to_bits())
    }

    /// Write a narrow string with a trailing NUL. Bounding the destination is
    /// the caller's responsibility; the true extent is not knowable here.
    fn write_string(&self, address: Address, text: &str) -> Result<()> {
        self.write_bytes(address, &encode_c_string(text))
    }

    /// Write a UTF-16 string with a trailing 2-byte NUL.
    fn write_wide_string(&self, address: Address, text: &str) -> Result<()> {
        self.write_bytes(address, &encode_wide_string(text))
    }

    /// Write the first `len` bytes of a staging buffer to foreign memory.
    fn write_from_buffer(
        &self,
        pool: &BufferPool,
        handle: BufferHandle,
        address: Address,
        len: usize,
    ) -> Result<()> {
        let src = pool.bytes(handle)?;
        if len > src.len() {
            return Err(Error::OutOfBounds {
                offset: 0,
                len,
                size: src.len(),
            });
        }
        self.write_bytes(address, &src[..len])
    }
}

/// The live address space of an attached process.
pub struct ProcessMemory {
    handle: ProcessHandle,
    page_checked: bool,
}

impl ProcessMemory {
    pub(crate) fn new(handle: ProcessHandle, page_checked: bool) -> Self {
        Self {
            handle,
            page_checked,
        }
    }

    pub fn process(&self) -> &ProcessHandle {
        &self.handle
    }

    /// Whether transfers run through the page-checked fallback path.
    pub fn is_page_checked(&self) -> bool {
        self.page_checked
    }

    #[cfg(target_os = "windows")]
    fn read_bytes_impl(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        if self.page_checked {
            return self.read_bytes_paged(address, len);
        }
        read_raw(&self.handle, address, len)
    }

    #[cfg(target_os = "windows")]
    fn write_bytes_impl(&self, address: Address, data: &[u8]) -> Result<()> {
        if self.page_checked {
            return self.write_bytes_paged(address, data);
        }
        write_raw(&self.handle, address, data)
    }

    /// Page-checked read: each page's mapping is validated through the OS
    /// immediately before its slice is copied. Selected by the
    /// corrupt-page-tables attach hint.
    #[cfg(target_os = "windows")]
    fn read_bytes_paged(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        for (page_addr, page_len) in page_spans(address, len) {
            self.probe_page(page_addr)?;
            out.extend_from_slice(&read_raw(&self.handle, page_addr, page_len)?);
        }
        Ok(out)
    }

    #[cfg(target_os = "windows")]
    fn write_bytes_paged(&self, address: Address, data: &[u8]) -> Result<()> {
        let mut consumed = 0usize;
        for (page_addr, page_len) in page_spans(address, data.len()) {
            self.probe_page(page_addr)?;
            write_raw(&self.handle, page_addr, &data[consumed..consumed + page_len])?;
            consumed += page_len;
        }
        Ok(())
    }

    /// Fails unless the page containing `address` is committed and accessible.
    #[cfg(target_os = "windows")]
    fn probe_page(&self, address: Address) -> Result<()> {
        let mut info = MEMORY_BASIC_INFORMATION::default();
        // SAFETY: VirtualQueryEx is called with a valid process handle, an
        // arbitrary foreign address, and a correctly sized out-structure.
        let written = unsafe {
            VirtualQueryEx(
                self.handle.handle(),
                Some(address.get() as *const _),
                &mut info,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };

        let unmapped = written == 0
            || info.State != MEM_COMMIT
            || (info.Protect.0 & (PAGE_NOACCESS.0 | PAGE_GUARD.0)) != 0;
        if unmapped {
            return Err(Error::MemoryReadFailed {
                address: address.get(),
                message: "page is not committed or not accessible".to_string(),
            });
        }
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn read_bytes_impl(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        Err(Error::MemoryReadFailed {
            address: address.get(),
            message: "memory access is only supported on Windows".to_string(),
        })
    }

    #[cfg(not(target_os = "windows"))]
    fn write_bytes_impl(&self, address: Address, data: &[u8]) -> Result<()> {
        Err(Error::MemoryWriteFailed {
            address: address.get(),
            message: "memory access is only supported on Windows".to_string(),
        })
    }
}

impl ReadMemory for ProcessMemory {
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        self.read_bytes_impl(address, len)
    }
}

impl WriteMemory for ProcessMemory {
    fn write_bytes(&self, address: Address, data: &[u8]) -> Result<()> {
        self.write_bytes_impl(address, data)
    }
}

/// Splits `[address, address + len)` at page boundaries.
fn page_spans(address: Address, len: usize) -> impl Iterator<Item = (Address, usize)> {
    let mut cursor = address.get();
    let end = cursor.saturating_add(len as u64);
    std::iter::from_fn(move || {
        if cursor >= end {
            return None;
        }
        let span = (PAGE_SIZE - cursor % PAGE_SIZE).min(end - cursor) as usize;
        let item = (Address::new(cursor), span);
        cursor += span as u64;
        Some(item)
    })
}

#[cfg(target_os = "windows")]
fn read_raw(handle: &ProcessHandle, address: Address, len: usize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; len];
    let mut bytes_read = 0;

    // SAFETY: ReadProcessMemory is called with a valid process handle, an
    // arbitrary foreign address, and a buffer of the requested size; failures
    // surface through the Result.
    unsafe {
        ReadProcessMemory(
            handle.handle(),
            address.get() as *const _,
            buffer.as_mut_ptr() as *mut _,
            len,
            Some(&mut bytes_read),
        )
        .map_err(|e| Error::MemoryReadFailed {
            address: address.get(),
            message: e.to_string(),
        })?;
    }

    // All-or-nothing: callers interpret fixed-width values and structures, so
    // a partial transfer is an error.
    if bytes_read != len {
        return Err(Error::MemoryReadFailed {
            address: address.get(),
            message: format!("Expected {} bytes, read {}", len, bytes_read),
        });
    }

    Ok(buffer)
}

#[cfg(target_os = "windows")]
fn write_raw(handle: &ProcessHandle, address: Address, data: &[u8]) -> Result<()> {
    let mut bytes_written = 0;

    // SAFETY: WriteProcessMemory is called with a valid process handle opened
    // with write access and a host-local source buffer of the stated length.
    unsafe {
        WriteProcessMemory(
            handle.handle(),
            address.get() as *const _,
            data.as_ptr() as *const _,
            data.len(),
            Some(&mut bytes_written),
        )
        .map_err(|e| Error::MemoryWriteFailed {
            address: address.get(),
            message: e.to_string(),
        })?;
    }

    if bytes_written != data.len() {
        return Err(Error::MemoryWriteFailed {
            address: address.get(),
            message: format!("Expected {} bytes, wrote {}", data.len(), bytes_written),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockMemory;

    #[test]
    fn test_read_i32() {
        let memory = MockMemory::new(vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(memory.read_i32(Address::new(0x1000)).unwrap(), 0x12345678);
    }

    #[test]
    fn test_read_i32_negative() {
        let memory = MockMemory::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(memory.read_i32(Address::new(0x1000)).unwrap(), -1);
    }

    #[test]
    fn test_read_u64() {
        let memory = MockMemory::new(vec![0xEF, 0xCD, 0xAB, 0x90, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(
            memory.read_u64(Address::new(0x1000)).unwrap(),
            0x1234567890ABCDEF
        );
    }

    #[test]
    fn test_read_f64_bit_exact() {
        let memory = MockMemory::new(f64::NAN.to_le_bytes().to_vec());
        let value = memory.read_f64(Address::new(0x1000)).unwrap();
        assert_eq!(value.to_bits(), f64::NAN.to_bits());
    }

    #[test]
    fn test_read_out_of_bounds() {
        let memory = MockMemory::new(vec![0x01, 0x02]);
        assert!(memory.read_u32(Address::new(0x1000)).is_err());
    }

    #[test]
    fn test_write_then_read() {
        let memory = MockMemory::new(vec![0u8; 16]);
        memory.write_i64(Address::new(0x1008), -42).unwrap();
        assert_eq!(memory.read_i64(Address::new(0x1008)).unwrap(), -42);
    }

    #[test]
    fn test_string_roundtrip() {
        let memory = MockMemory::new(vec![0u8; 32]);
        memory.write_string(Address::new(0x1000), "hello").unwrap();
        assert_eq!(memory.read_string(Address::new(0x1000), 32).unwrap(), "hello");
    }

    #[test]
    fn test_string_truncated_read() {
        let memory = MockMemory::new(vec![0u8; 32]);
        memory.write_string(Address::new(0x1000), "hello").unwrap();
        assert_eq!(memory.read_string(Address::new(0x1000), 3).unwrap(), "hel");
    }

    #[test]
    fn test_wide_string_roundtrip() {
        let memory = MockMemory::new(vec![0u8; 32]);
        memory
            .write_wide_string(Address::new(0x1000), "wide")
            .unwrap();
        assert_eq!(
            memory.read_wide_string(Address::new(0x1000), 8).unwrap(),
            "wide"
        );
    }

    #[test]
    fn test_page_spans() {
        let spans: Vec<_> = page_spans(Address::new(0x1FF0), 0x20).collect();
        assert_eq!(
            spans,
            vec![(Address::new(0x1FF0), 0x10), (Address::new(0x2000), 0x10)]
        );
    }

    #[test]
    fn test_page_spans_single_page() {
        let spans: Vec<_> = page_spans(Address::new(0x1000), 0x10).collect();
        assert_eq!(spans, vec![(Address::new(0x1000), 0x10)]);
    }
}
