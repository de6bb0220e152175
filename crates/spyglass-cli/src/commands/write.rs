//! Write command implementation.

use anyhow::{Context, Result};
use spyglass_core::WriteMemory;

use super::{AttachArgs, ScalarKind, parse_address, parse_kind};

/// Run the write command
pub fn run(attach: &AttachArgs, address: &str, kind: &str, value: &str) -> Result<()> {
    let session = attach.attach()?;
    let address = parse_address(address)?;
    let kind = parse_kind(kind)?;
    let memory = session.memory()?;

    let context = || format!("parsing '{}' as {}", value, <&'static str>::from(kind));
    match kind {
        ScalarKind::I8 => memory.write_i8(address, value.parse().with_context(context)?)?,
        ScalarKind::I16 => memory.write_i16(address, value.parse().with_context(context)?)?,
        ScalarKind::I32 => memory.write_i32(address, value.parse().with_context(context)?)?,
        ScalarKind::I64 => memory.write_i64(address, value.parse().with_context(context)?)?,
        ScalarKind::U8 => memory.write_u8(address, value.parse().with_context(context)?)?,
        ScalarKind::U16 => memory.write_u16(address, value.parse().with_context(context)?)?,
        ScalarKind::U32 => memory.write_u32(address, value.parse().with_context(context)?)?,
        ScalarKind::U64 => memory.write_u64(address, value.parse().with_context(context)?)?,
        ScalarKind::F32 => memory.write_f32(address, value.parse().with_context(context)?)?,
        ScalarKind::F64 => memory.write_f64(address, value.parse().with_context(context)?)?,
    }

    let kind_name: &'static str = kind.into();
    println!("Wrote {} {} at {}", kind_name, value, address);

    Ok(())
}
