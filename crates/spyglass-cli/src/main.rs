use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::AttachArgs;

#[derive(Parser)]
#[command(name = "spyglass")]
#[command(about = "Foreign-process memory inspector", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attach to a process and report its state
    Status {
        #[command(flatten)]
        attach: AttachArgs,
    },
    /// List loaded modules, or look one up by name
    Modules {
        #[command(flatten)]
        attach: AttachArgs,

        /// Module name to resolve instead of listing everything
        #[arg(long)]
        name: Option<String>,
    },
    /// Scan a module or address range for a byte signature
    Scan {
        #[command(flatten)]
        attach: AttachArgs,

        /// Inline pattern, e.g. "48 8B ?? 05"
        #[arg(long, conflicts_with_all = ["sig_file", "sig_name"])]
        pattern: Option<String>,

        /// JSON signature catalog
        #[arg(long, requires = "sig_name")]
        sig_file: Option<PathBuf>,

        /// Catalog entry to scan for
        #[arg(long)]
        sig_name: Option<String>,

        /// Module to scan (defaults to the base module)
        #[arg(long)]
        module: Option<String>,

        /// Scan start address (hex) instead of a module; requires --size
        #[arg(long, requires = "size")]
        start: Option<String>,

        /// Scan size in bytes
        #[arg(long)]
        size: Option<u64>,
    },
    /// Read a typed value at an address
    Read {
        #[command(flatten)]
        attach: AttachArgs,

        /// Address (hex)
        #[arg(long)]
        address: String,

        /// Value kind: i8|i16|i32|i64|u8|u16|u32|u64|f32|f64
        #[arg(long, default_value = "i32")]
        kind: String,
    },
    /// Write a typed value at an address
    Write {
        #[command(flatten)]
        attach: AttachArgs,

        /// Address (hex)
        #[arg(long)]
        address: String,

        /// Value kind: i8|i16|i32|i64|u8|u16|u32|u64|f32|f64
        #[arg(long, default_value = "i32")]
        kind: String,

        /// Value to write
        #[arg(long)]
        value: String,
    },
    /// Dump a memory range as hex or to a file
    Dump {
        #[command(flatten)]
        attach: AttachArgs,

        /// Address (hex)
        #[arg(long)]
        address: String,

        /// Number of bytes to dump
        #[arg(long, default_value = "256")]
        size: usize,

        /// Write raw bytes to this file instead of hexdumping
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write raw bytes to a timestamped file
        #[arg(long, conflicts_with = "out")]
        save: bool,

        /// Include an ASCII column in the hexdump
        #[arg(long)]
        ascii: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("spyglass=info".parse()?)
                .add_directive("spyglass_core=info".parse()?),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Status { attach } => commands::status::run(&attach),
        Command::Modules { attach, name } => commands::modules::run(&attach, name.as_deref()),
        Command::Scan {
            attach,
            pattern,
            sig_file,
            sig_name,
            module,
            start,
            size,
        } => commands::scan::run(
            &attach,
            pattern.as_deref(),
            sig_file.as_deref(),
            sig_name.as_deref(),
            module.as_deref(),
            start.as_deref(),
            size,
        ),
        Command::Read {
            attach,
            address,
            kind,
        } => commands::read::run(&attach, &address, &kind),
        Command::Write {
            attach,
            address,
            kind,
            value,
        } => commands::write::run(&attach, &address, &kind, &value),
        Command::Dump {
            attach,
            address,
            size,
            out,
            save,
            ascii,
        } => commands::dump::run(&attach, &address, size, out.as_deref(), save, ascii),
    }
}
