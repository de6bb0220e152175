#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

//! Loaded-module enumeration for an attached process.
//!
//! Modules are resolved on demand from the target's live module list; nothing
//! is cached here. A target that unloads or reloads a module between calls
//! makes earlier results stale, which is expected, not exceptional.

use crate::address::Address;
use crate::error::{Error, Result};
use crate::process::ProcessHandle;

#[cfg(target_os = "windows")]
use std::ffi::OsString;
#[cfg(target_os = "windows")]
use std::os::windows::ffi::OsStringExt;
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::CloseHandle;
#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, TH32CS_SNAPMODULE,
    TH32CS_SNAPMODULE32,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::ProcessStatus::GetModuleBaseNameW;

/// A loaded executable image in the target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub base: Address,
    pub size: u64,
}

impl ProcessHandle {
    /// The primary executable image, independent of its name.
    #[cfg(target_os = "windows")]
    pub fn base_module(&self) -> Result<ModuleInfo> {
        let mut name_buf = [0u16; 260];
        // SAFETY: GetModuleBaseNameW is called with a valid process handle;
        // a None module resolves the process's primary image. The name buffer
        // receives at most its length in code units.
        let written = unsafe { GetModuleBaseNameW(self.handle(), None, &mut name_buf) };
        let name = if written == 0 {
            String::new()
        } else {
            String::from_utf16_lossy(&name_buf[..written as usize])
        };

        Ok(ModuleInfo {
            name,
            base: self.base_address(),
            size: self.base_size(),
        })
    }

    #[cfg(not(target_os = "windows"))]
    pub fn base_module(&self) -> Result<ModuleInfo> {
        Err(unsupported())
    }

    /// Snapshot of every module currently loaded in the target.
    #[cfg(target_os = "windows")]
    pub fn modules(&self) -> Result<Vec<ModuleInfo>> {
        // SAFETY: CreateToolhelp32Snapshot with the module flags and a valid
        // pid is safe to call; the handle is closed before returning.
        let snapshot = unsafe {
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, self.pid())
                .map_err(|e| Error::ProcessOpenFailed(e.to_string()))?
        };

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut modules = Vec::new();
        // SAFETY: Module32FirstW/Module32NextW walk a valid snapshot with a
        // properly initialized MODULEENTRY32W. szModule is NUL-terminated by
        // the API; the position fallback guards a violated invariant.
        unsafe {
            if Module32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    let name = OsString::from_wide(
                        &entry.szModule[..entry
                            .szModule
                            .iter()
                            .position(|&c| c == 0)
                            .unwrap_or(entry.szModule.len())],
                    );

                    modules.push(ModuleInfo {
                        name: name.to_string_lossy().into_owned(),
                        base: Address::new(entry.modBaseAddr as u64),
                        size: entry.modBaseSize as u64,
                    });

                    if Module32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }
        }

        // SAFETY: snapshot is a valid handle from CreateToolhelp32Snapshot.
        let _ = unsafe { CloseHandle(snapshot) };
        Ok(modules)
    }

    #[cfg(not(target_os = "windows"))]
    pub fn modules(&self) -> Result<Vec<ModuleInfo>> {
        Err(unsupported())
    }

    /// Look up a module by name. Absence is `Ok(None)`, not an error.
    pub fn find_module(&self, name: &str) -> Result<Option<ModuleInfo>> {
        Ok(self
            .modules()?
            .into_iter()
            .find(|m| module_name_matches(&m.name, name)))
    }
}

#[cfg(not(target_os = "windows"))]
fn unsupported() -> Error {
    Error::ProcessOpenFailed("module enumeration is only supported on Windows".to_string())
}

/// Case-insensitive exact match, plus a suffix match so qualified names
/// still resolve ("bin\\client.dll" finds "client.dll" and vice versa).
fn module_name_matches(entry: &str, query: &str) -> bool {
    if entry.eq_ignore_ascii_case(query) {
        return true;
    }
    let entry_tail = entry.rsplit(['\\', '/']).next().unwrap_or(entry);
    let query_tail = query.rsplit(['\\', '/']).next().unwrap_or(query);
    entry_tail.eq_ignore_ascii_case(query_tail)
}
