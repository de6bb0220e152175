//! Modules command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;

use super::AttachArgs;

/// Run the modules command
pub fn run(attach: &AttachArgs, name: Option<&str>) -> Result<()> {
    let session = attach.attach()?;

    if let Some(name) = name {
        // Absence is a normal outcome, reported rather than escalated.
        match session.find_module(name)? {
            Some(module) => println!(
                "{:<32} base={}  size={:#x}",
                module.name, module.base, module.size
            ),
            None => println!("Module '{}' {}", name, "not found".yellow()),
        }
        return Ok(());
    }

    let modules = session.memory()?.process().modules()?;
    println!("{} modules loaded:", modules.len());
    for module in &modules {
        println!(
            "  {:<32} base={}  size={:#x}",
            module.name, module.base, module.size
        );
    }

    Ok(())
}
