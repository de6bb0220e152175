pub mod dump;
pub mod modules;
pub mod read;
pub mod scan;
pub mod status;
pub mod write;

use anyhow::{Result, anyhow, bail};
use strum::{EnumString, IntoStaticStr};

use spyglass_core::{Address, AttachOptions, Session};

/// Target selection shared by every subcommand.
#[derive(Debug, clap::Args)]
pub struct AttachArgs {
    /// Attach by process id
    #[arg(long)]
    pub pid: Option<u32>,

    /// Attach by executable name
    #[arg(long)]
    pub process: Option<String>,

    /// Attach by top-level window title
    #[arg(long)]
    pub window_title: Option<String>,

    /// Attach by top-level window class
    #[arg(long)]
    pub window_class: Option<String>,

    /// Distrust the target's page tables and use page-checked transfers
    #[arg(long)]
    pub corrupt_page_tables: bool,
}

impl AttachArgs {
    pub fn attach(&self) -> Result<Session> {
        let options = AttachOptions {
            corrupt_page_tables: self.corrupt_page_tables,
        };

        let mut session = Session::new();
        if let Some(pid) = self.pid {
            session.attach_pid(pid, options)?;
        } else if let Some(name) = &self.process {
            session.attach_name(name, options)?;
        } else if self.window_title.is_some() || self.window_class.is_some() {
            session.attach_window(
                self.window_class.as_deref(),
                self.window_title.as_deref(),
                options,
            )?;
        } else {
            bail!("specify a target: --pid, --process, or --window-title/--window-class");
        }
        Ok(session)
    }
}

/// Widths addressable by the read/write commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

pub fn parse_kind(text: &str) -> Result<ScalarKind> {
    text.parse()
        .map_err(|_| anyhow!("unknown value kind '{}' (expected i8..i64, u8..u64, f32, f64)", text))
}

/// Parses a hex address, with or without a 0x prefix; underscores are
/// allowed as separators.
pub fn parse_address(text: &str) -> Result<Address> {
    let cleaned = text.trim().replace('_', "");
    let digits = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    let value = u64::from_str_radix(digits, 16)
        .map_err(|e| anyhow!("invalid address '{}': {}", text, e))?;
    Ok(Address::new(value))
}
