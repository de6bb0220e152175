//! Round-trip tests for typed memory access over the mock address space.

use spyglass_core::Address;
use spyglass_core::process::{MockMemory, MockMemoryBuilder, ReadMemory, WriteMemory};

fn scratch(len: usize) -> MockMemory {
    MockMemory::new(vec![0u8; len])
}

#[test]
fn test_i8_roundtrip_boundaries() {
    let memory = scratch(16);
    let addr = Address::new(0x1000);

    for value in [0i8, i8::MIN, i8::MAX, -1] {
        memory.write_i8(addr, value).unwrap();
        assert_eq!(memory.read_i8(addr).unwrap(), value);
    }
}

#[test]
fn test_i16_roundtrip_boundaries() {
    let memory = scratch(16);
    let addr = Address::new(0x1000);

    for value in [0i16, i16::MIN, i16::MAX, -1] {
        memory.write_i16(addr, value).unwrap();
        assert_eq!(memory.read_i16(addr).unwrap(), value);
    }
}

#[test]
fn test_i32_roundtrip_boundaries() {
    let memory = scratch(16);
    let addr = Address::new(0x1000);

    for value in [0i32, i32::MIN, i32::MAX, -1] {
        memory.write_i32(addr, value).unwrap();
        assert_eq!(memory.read_i32(addr).unwrap(), value);
    }
}

#[test]
fn test_i64_roundtrip_boundaries() {
    let memory = scratch(16);
    let addr = Address::new(0x1000);

    for value in [0i64, i64::MIN, i64::MAX, -1] {
        memory.write_i64(addr, value).unwrap();
        assert_eq!(memory.read_i64(addr).unwrap(), value);
    }
}

#[test]
fn test_unsigned_roundtrips() {
    let memory = scratch(16);
    let addr = Address::new(0x1000);

    memory.write_u8(addr, u8::MAX).unwrap();
    assert_eq!(memory.read_u8(addr).unwrap(), u8::MAX);

    memory.write_u16(addr, u16::MAX).unwrap();
    assert_eq!(memory.read_u16(addr).unwrap(), u16::MAX);

    memory.write_u32(addr, u32::MAX).unwrap();
    assert_eq!(memory.read_u32(addr).unwrap(), u32::MAX);

    memory.write_u64(addr, u64::MAX).unwrap();
    assert_eq!(memory.read_u64(addr).unwrap(), u64::MAX);
}

#[test]
fn test_f32_roundtrip_bit_exact() {
    let memory = scratch(16);
    let addr = Address::new(0x1000);

    for value in [0.0f32, -0.0, 1.5, f32::MIN, f32::MAX, f32::INFINITY, f32::NEG_INFINITY] {
        memory.write_f32(addr, value).unwrap();
        assert_eq!(memory.read_f32(addr).unwrap().to_bits(), value.to_bits());
    }

    memory.write_f32(addr, f32::NAN).unwrap();
    assert_eq!(memory.read_f32(addr).unwrap().to_bits(), f32::NAN.to_bits());
}

#[test]
fn test_f64_roundtrip_bit_exact() {
    let memory = scratch(16);
    let addr = Address::new(0x1000);

    for value in [0.0f64, -0.0, 2.5, f64::MIN, f64::MAX, f64::INFINITY, f64::NEG_INFINITY] {
        memory.write_f64(addr, value).unwrap();
        assert_eq!(memory.read_f64(addr).unwrap().to_bits(), value.to_bits());
    }

    memory.write_f64(addr, f64::NAN).unwrap();
    assert_eq!(memory.read_f64(addr).unwrap().to_bits(), f64::NAN.to_bits());
}

#[test]
fn test_failed_read_is_an_error_not_zero() {
    let memory = MockMemoryBuilder::new()
        .with_size(0x20)
        .gap(0x10, 0x10)
        .build();

    // A value of zero in readable memory is a value, not a failure.
    assert_eq!(memory.read_i32(Address::new(0x1000)).unwrap(), 0);
    // The gap fails loudly instead of producing garbage or zero.
    assert!(memory.read_i32(Address::new(0x1010)).is_err());
    // Reads past the image fail the same way.
    assert!(memory.read_i32(Address::new(0x2000)).is_err());
}

#[test]
fn test_string_roundtrip_with_room_for_terminator() {
    let memory = scratch(64);
    let addr = Address::new(0x1010);

    memory.write_string(addr, "signature").unwrap();
    // max_len >= len + 1 returns the string unmodified.
    assert_eq!(memory.read_string(addr, 10).unwrap(), "signature");
    assert_eq!(memory.read_string(addr, 32).unwrap(), "signature");
}

#[test]
fn test_string_truncated_when_max_len_cuts_terminator() {
    let memory = scratch(64);
    let addr = Address::new(0x1000);

    memory.write_string(addr, "signature").unwrap();
    assert_eq!(memory.read_string(addr, 4).unwrap(), "sign");
}

#[test]
fn test_wide_string_roundtrip() {
    let memory = scratch(64);
    let addr = Address::new(0x1000);

    memory.write_wide_string(addr, "ユーザー").unwrap();
    assert_eq!(memory.read_wide_string(addr, 16).unwrap(), "ユーザー");
    // Truncation by code units, terminator cut off.
    assert_eq!(memory.read_wide_string(addr, 2).unwrap(), "ユー");
}

#[test]
fn test_read_address_is_typed() {
    let memory = MockMemoryBuilder::new()
        .write_u64(0, 0x7FF6_1234_5678)
        .build();

    let pointer = memory.read_address(Address::new(0x1000)).unwrap();
    assert_eq!(pointer, Address::new(0x7FF6_1234_5678));
}
