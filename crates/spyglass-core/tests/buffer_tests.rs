//! Staging-buffer interplay with a memory source.

use spyglass_core::process::{MockMemoryBuilder, ReadMemory, WriteMemory};
use spyglass_core::{Address, BufferPool, Error};

#[test]
fn test_stage_read_then_write_back() {
    let memory = MockMemoryBuilder::new()
        .with_size(0x100)
        .write_bytes(0x10, &[0xCA, 0xFE, 0xBA, 0xBE])
        .build();

    let mut pool = BufferPool::new();
    let staging = pool.alloc(4);

    memory
        .read_to_buffer(Address::new(0x1010), &mut pool, staging, 4)
        .unwrap();
    assert_eq!(pool.bytes(staging).unwrap(), &[0xCA, 0xFE, 0xBA, 0xBE]);

    memory
        .write_from_buffer(&pool, staging, Address::new(0x1080), 4)
        .unwrap();
    assert_eq!(
        memory.read_bytes(Address::new(0x1080), 4).unwrap(),
        vec![0xCA, 0xFE, 0xBA, 0xBE]
    );
}

#[test]
fn test_stage_transfer_longer_than_buffer_fails() {
    let memory = MockMemoryBuilder::new().with_size(0x100).build();
    let mut pool = BufferPool::new();
    let staging = pool.alloc(4);

    assert!(matches!(
        memory.read_to_buffer(Address::new(0x1000), &mut pool, staging, 8),
        Err(Error::OutOfBounds { .. })
    ));
    assert!(matches!(
        memory.write_from_buffer(&pool, staging, Address::new(0x1000), 8),
        Err(Error::OutOfBounds { .. })
    ));
}

#[test]
fn test_stage_with_freed_handle_fails() {
    let memory = MockMemoryBuilder::new().with_size(0x100).build();
    let mut pool = BufferPool::new();
    let staging = pool.alloc(4);
    pool.free(staging).unwrap();

    assert!(matches!(
        memory.read_to_buffer(Address::new(0x1000), &mut pool, staging, 4),
        Err(Error::InvalidHandle(_))
    ));
    assert!(matches!(
        memory.write_from_buffer(&pool, staging, Address::new(0x1000), 4),
        Err(Error::InvalidHandle(_))
    ));
}

#[test]
fn test_failed_foreign_read_leaves_buffer_untouched() {
    let memory = MockMemoryBuilder::new()
        .with_size(0x20)
        .gap(0x10, 0x10)
        .build();

    let mut pool = BufferPool::new();
    let staging = pool.alloc(4);
    pool.write_u32(staging, 0, 0x11223344).unwrap();

    assert!(
        memory
            .read_to_buffer(Address::new(0x1010), &mut pool, staging, 4)
            .is_err()
    );
    assert_eq!(pool.read_u32(staging, 0).unwrap(), 0x11223344);
}

#[test]
fn test_pool_outlives_memory_source() {
    let mut pool = BufferPool::new();
    let payload = pool.alloc(16);

    {
        let memory = MockMemoryBuilder::new()
            .with_size(0x20)
            .write_c_string(0, "response")
            .build();
        memory
            .read_to_buffer(Address::new(0x1000), &mut pool, payload, 9)
            .unwrap();
    }

    // The source is gone; the staged payload is still readable.
    assert_eq!(pool.read_string(payload, 0).unwrap(), "response");
}
