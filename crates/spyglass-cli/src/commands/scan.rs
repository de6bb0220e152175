//! Scan command implementation.
//!
//! Resolves a search range (a module image by default, or an explicit
//! address range) and runs a wildcard signature scan over it. Signatures
//! come inline or from a JSON catalog.

use std::path::Path;

use anyhow::{Result, anyhow, bail};
use owo_colors::OwoColorize;
use spyglass_core::scan::MAX_SCAN_SIZE;
use spyglass_core::{Signature, load_signature_set};
use tracing::warn;

use super::{AttachArgs, parse_address};

/// Run the scan command
#[allow(clippy::too_many_arguments)]
pub fn run(
    attach: &AttachArgs,
    pattern: Option<&str>,
    sig_file: Option<&Path>,
    sig_name: Option<&str>,
    module: Option<&str>,
    start: Option<&str>,
    size: Option<u64>,
) -> Result<()> {
    let session = attach.attach()?;
    let signature = resolve_signature(pattern, sig_file, sig_name)?;

    let (start_addr, span, label) = if let Some(start) = start {
        let addr = parse_address(start)?;
        let span = size.ok_or_else(|| anyhow!("--start requires --size"))?;
        (addr, span, format!("range {}", addr))
    } else if let Some(name) = module {
        let info = session
            .find_module(name)?
            .ok_or_else(|| anyhow!("module '{}' not found in target", name))?;
        (info.base, info.size, info.name)
    } else {
        let info = session.base_module()?;
        (info.base, info.size, info.name)
    };

    if span > MAX_SCAN_SIZE {
        warn!(
            "Requested {:#x} bytes; the scan will be clamped to {:#x}",
            span, MAX_SCAN_SIZE
        );
    }

    println!(
        "Scanning {} ({:#x} bytes at {}) for: {}",
        label, span, start_addr, signature
    );

    match session.find_signature(start_addr, span, &signature)? {
        Some(hit) => {
            println!(
                "{} {}  ({}+{:#x})",
                "Found at".green(),
                hit,
                label,
                hit.get() - start_addr.get()
            );
        }
        None => println!("{}", "No match".yellow()),
    }

    Ok(())
}

fn resolve_signature(
    pattern: Option<&str>,
    sig_file: Option<&Path>,
    sig_name: Option<&str>,
) -> Result<Signature> {
    if let Some(pattern) = pattern {
        return Ok(Signature::parse(pattern)?);
    }

    let (Some(file), Some(name)) = (sig_file, sig_name) else {
        bail!("provide --pattern, or --sig-file together with --sig-name");
    };

    let set = load_signature_set(file)?;
    let entry = set
        .entry(name)
        .ok_or_else(|| anyhow!("signature '{}' not found in {}", name, file.display()))?;
    Ok(entry.signature()?)
}
