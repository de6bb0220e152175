//! Dump command implementation.
//!
//! Reads a memory range and either hexdumps it to stdout or writes the raw
//! bytes to a file.

use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::Local;
use spyglass_core::{Address, ReadMemory};

use super::{AttachArgs, parse_address};

/// Run the dump command
pub fn run(
    attach: &AttachArgs,
    address: &str,
    size: usize,
    out: Option<&Path>,
    save: bool,
    ascii: bool,
) -> Result<()> {
    let session = attach.attach()?;
    let address = parse_address(address)?;
    let bytes = session.memory()?.read_bytes(address, size)?;

    if let Some(path) = out {
        fs::write(path, &bytes)?;
        println!("Wrote {} bytes to {}", bytes.len(), path.display());
        return Ok(());
    }

    if save {
        let path = format!(
            "dump_{}_{:x}.bin",
            Local::now().format("%Y%m%d_%H%M%S"),
            address.get()
        );
        fs::write(&path, &bytes)?;
        println!("Wrote {} bytes to {}", bytes.len(), path);
        return Ok(());
    }

    println!("Dump of {:#x} bytes at {}:", bytes.len(), address);
    println!();
    hexdump(address, &bytes, ascii);

    Ok(())
}

fn hexdump(start: Address, bytes: &[u8], ascii: bool) {
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let mut line = format!("{:016x}  ", start.get() + row as u64 * 16);

        for i in 0..16 {
            match chunk.get(i) {
                Some(byte) => line.push_str(&format!("{:02X} ", byte)),
                None => line.push_str("   "),
            }
            if i == 7 {
                line.push(' ');
            }
        }

        if ascii {
            line.push_str(" |");
            for byte in chunk {
                line.push(if (0x20..0x7F).contains(byte) {
                    *byte as char
                } else {
                    '.'
                });
            }
            line.push('|');
        }

        println!("{}", line.trim_end());
    }
}
