//! Read command implementation.

use anyhow::Result;
use spyglass_core::ReadMemory;

use super::{AttachArgs, ScalarKind, parse_address, parse_kind};

/// Run the read command
pub fn run(attach: &AttachArgs, address: &str, kind: &str) -> Result<()> {
    let session = attach.attach()?;
    let address = parse_address(address)?;
    let kind = parse_kind(kind)?;
    let memory = session.memory()?;

    let rendered = match kind {
        ScalarKind::I8 => memory.read_i8(address)?.to_string(),
        ScalarKind::I16 => memory.read_i16(address)?.to_string(),
        ScalarKind::I32 => memory.read_i32(address)?.to_string(),
        ScalarKind::I64 => memory.read_i64(address)?.to_string(),
        ScalarKind::U8 => memory.read_u8(address)?.to_string(),
        ScalarKind::U16 => memory.read_u16(address)?.to_string(),
        ScalarKind::U32 => memory.read_u32(address)?.to_string(),
        ScalarKind::U64 => memory.read_u64(address)?.to_string(),
        ScalarKind::F32 => memory.read_f32(address)?.to_string(),
        ScalarKind::F64 => memory.read_f64(address)?.to_string(),
    };

    let kind_name: &'static str = kind.into();
    println!("{} at {} = {}", kind_name, address, rendered);

    Ok(())
}
