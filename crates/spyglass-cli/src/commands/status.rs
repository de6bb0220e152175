//! Status command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;
use spyglass_core::ReadMemory;

use super::AttachArgs;

/// Run the status command
pub fn run(attach: &AttachArgs) -> Result<()> {
    println!("Spyglass {} - Status", env!("CARGO_PKG_VERSION"));

    let session = attach.attach()?;
    let memory = session.memory()?;

    println!();
    println!("PID:          {}", session.pid()?);
    println!("Base address: {}", session.base_address()?);
    println!("PEB:          {}", session.peb()?);

    let module = session.base_module()?;
    println!("Base module:  {} ({:#x} bytes)", module.name, module.size);

    // Any mapped PE image starts with the MZ magic; an unreadable header
    // usually means the attach succeeded but reads will not.
    let header_ok = matches!(memory.read_u16(session.base_address()?), Ok(0x5A4D));
    println!(
        "Image header: {}",
        if header_ok {
            "valid".green().to_string()
        } else {
            "unreadable".red().to_string()
        }
    );

    println!(
        "Transfers:    {}",
        if memory.is_page_checked() {
            "page-checked"
        } else {
            "direct"
        }
    );
    println!(
        "Liveness:     {}",
        if session.did_exit() {
            "exited".red().to_string()
        } else {
            "running".green().to_string()
        }
    );

    Ok(())
}
