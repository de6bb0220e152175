#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use crate::address::Address;
use crate::error::{Error, Result};

#[cfg(target_os = "windows")]
use tracing::{debug, warn};

#[cfg(target_os = "windows")]
use std::ffi::{OsString, c_void};
#[cfg(target_os = "windows")]
use std::os::windows::ffi::OsStringExt;
#[cfg(target_os = "windows")]
use windows::Wdk::System::Threading::{NtQueryInformationProcess, ProcessBasicInformation};
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE};
#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::ProcessStatus::{
    EnumProcessModulesEx, GetModuleInformation, LIST_MODULES_ALL, MODULEINFO,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    GetExitCodeProcess, IsWow64Process, OpenProcess, PROCESS_BASIC_INFORMATION,
    PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE,
};
#[cfg(target_os = "windows")]
use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, GetWindowThreadProcessId};
#[cfg(target_os = "windows")]
use windows::core::PCWSTR;

/// An open handle to a foreign process.
///
/// Holds the OS handle plus the facts resolved at attach time: the primary
/// image base and size, and the PEB address. The handle is closed on drop.
#[cfg(target_os = "windows")]
pub struct ProcessHandle {
    handle: HANDLE,
    pid: u32,
    base_address: Address,
    base_size: u64,
    peb: Address,
}

#[cfg(not(target_os = "windows"))]
pub struct ProcessHandle {
    pid: u32,
    base_address: Address,
    base_size: u64,
    peb: Address,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Base address of the primary executable image.
    pub fn base_address(&self) -> Address {
        self.base_address
    }

    /// Image size of the primary executable image in bytes.
    pub fn base_size(&self) -> u64 {
        self.base_size
    }

    /// Address of the target's Process Environment Block.
    pub fn peb(&self) -> Address {
        self.peb
    }
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Opens a process by pid with read/write access.
    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess is called with valid access flags and an
        // arbitrary pid; a bad pid fails with an error. The returned handle
        // is owned by this struct and closed in Drop.
        let handle = unsafe {
            OpenProcess(
                PROCESS_QUERY_INFORMATION | PROCESS_VM_READ | PROCESS_VM_WRITE
                    | PROCESS_VM_OPERATION,
                false,
                pid,
            )
            .map_err(|e| {
                debug!("OpenProcess failed for PID {}: {}", pid, e);
                Error::ProcessOpenFailed(e.to_string())
            })?
        };

        let result = Self::from_raw(handle, pid);
        if result.is_err() {
            // SAFETY: handle came from OpenProcess above and has not been
            // stored anywhere else.
            let _ = unsafe { CloseHandle(handle) };
        }
        result
    }

    /// Finds a process by executable name and opens it.
    pub fn find_by_name(name: &str) -> Result<Self> {
        let pid = pid_by_name(name)?;
        debug!("Found '{}' with PID {}", name, pid);
        Self::open(pid)
    }

    /// Finds a top-level window by class and/or title and opens its process.
    pub fn find_by_window(class: Option<&str>, title: Option<&str>) -> Result<Self> {
        let describe = || {
            format!(
                "class={:?}, title={:?}",
                class.unwrap_or("*"),
                title.unwrap_or("*")
            )
        };

        let class_w = class.map(to_wide);
        let title_w = title.map(to_wide);
        let class_p = class_w
            .as_ref()
            .map(|w| PCWSTR::from_raw(w.as_ptr()))
            .unwrap_or_else(PCWSTR::null);
        let title_p = title_w
            .as_ref()
            .map(|w| PCWSTR::from_raw(w.as_ptr()))
            .unwrap_or_else(PCWSTR::null);

        // SAFETY: the wide buffers outlive the call; null PCWSTRs are valid
        // "match any" arguments to FindWindowW.
        let hwnd = unsafe { FindWindowW(class_p, title_p) }
            .map_err(|_| Error::WindowNotFound(describe()))?;

        let mut pid = 0u32;
        // SAFETY: hwnd was just returned by FindWindowW; pid is a valid
        // out-pointer for the owning process id.
        let thread = unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
        if thread == 0 || pid == 0 {
            return Err(Error::WindowNotFound(describe()));
        }

        debug!("Window ({}) belongs to PID {}", describe(), pid);
        Self::open(pid)
    }

    fn from_raw(handle: HANDLE, pid: u32) -> Result<Self> {
        verify_native_target(handle, pid)?;

        let (base_address, base_size) = primary_image_info(handle)?;
        let peb = query_peb(handle)?;

        Ok(Self {
            handle,
            pid,
            base_address,
            base_size,
            peb,
        })
    }

    pub(crate) fn handle(&self) -> HANDLE {
        self.handle
    }

    /// Check if the process is still running.
    pub fn is_alive(&self) -> bool {
        const STILL_ACTIVE: u32 = 259;

        let mut exit_code: u32 = 0;
        // SAFETY: GetExitCodeProcess is called with a valid process handle
        // and a properly initialized out-parameter.
        unsafe {
            if GetExitCodeProcess(self.handle, &mut exit_code).is_ok() {
                exit_code == STILL_ACTIVE
            } else {
                false
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn open(_pid: u32) -> Result<Self> {
        Err(unsupported())
    }

    pub fn find_by_name(_name: &str) -> Result<Self> {
        Err(unsupported())
    }

    pub fn find_by_window(_class: Option<&str>, _title: Option<&str>) -> Result<Self> {
        Err(unsupported())
    }

    /// Check if the process is still running (stub for non-Windows).
    pub fn is_alive(&self) -> bool {
        false
    }
}

#[cfg(not(target_os = "windows"))]
fn unsupported() -> Error {
    Error::ProcessOpenFailed("process attachment is only supported on Windows".to_string())
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: self.handle is a valid handle from OpenProcess that has
            // not been closed yet.
            if let Err(e) = unsafe { CloseHandle(self.handle) } {
                warn!("Failed to close process handle: {}", e);
            }
        }
    }
}

#[cfg(target_os = "windows")]
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Rejects WOW64 (32-bit) targets; address translation and the PEB layout
/// assume a native 64-bit process.
#[cfg(target_os = "windows")]
fn verify_native_target(handle: HANDLE, pid: u32) -> Result<()> {
    let mut wow64 = BOOL::default();
    // SAFETY: IsWow64Process is called with a valid process handle and a
    // properly initialized out-parameter.
    unsafe {
        IsWow64Process(handle, &mut wow64)
            .map_err(|e| Error::ProcessOpenFailed(format!("IsWow64Process failed: {}", e)))?;
    }
    if wow64.as_bool() {
        return Err(Error::ArchitectureMismatch { pid });
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn query_peb(handle: HANDLE) -> Result<Address> {
    let mut info = PROCESS_BASIC_INFORMATION::default();
    let mut returned = 0u32;

    // SAFETY: NtQueryInformationProcess is called with a valid process
    // handle, the ProcessBasicInformation class, and a correctly sized
    // out-structure.
    let status = unsafe {
        NtQueryInformationProcess(
            handle,
            ProcessBasicInformation,
            &mut info as *mut _ as *mut c_void,
            std::mem::size_of::<PROCESS_BASIC_INFORMATION>() as u32,
            &mut returned,
        )
    };

    if status.is_err() {
        return Err(Error::ProcessOpenFailed(format!(
            "NtQueryInformationProcess failed: {:#x}",
            status.0
        )));
    }

    Ok(Address::new(info.PebBaseAddress as u64))
}

#[cfg(target_os = "windows")]
fn pid_by_name(name: &str) -> Result<u32> {
    // SAFETY: CreateToolhelp32Snapshot with TH32CS_SNAPPROCESS is safe to
    // call; the returned handle is closed before returning.
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::ProcessNotFound(e.to_string()))?
    };

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    // SAFETY: Process32FirstW/Process32NextW are called with a valid snapshot
    // handle and a properly initialized PROCESSENTRY32W. szExeFile is
    // NUL-terminated by the API; the position fallback only guards against a
    // violated invariant.
    let result = unsafe {
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let exe_name = OsString::from_wide(
                    &entry.szExeFile[..entry
                        .szExeFile
                        .iter()
                        .position(|&c| c == 0)
                        .unwrap_or(entry.szExeFile.len())],
                );

                if exe_name.to_string_lossy().eq_ignore_ascii_case(name) {
                    let _ = CloseHandle(snapshot);
                    return Ok(entry.th32ProcessID);
                }

                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        Err(Error::ProcessNotFound(format!(
            "Process '{}' not found",
            name
        )))
    };

    // SAFETY: snapshot is a valid handle from CreateToolhelp32Snapshot.
    let _ = unsafe { CloseHandle(snapshot) };
    result
}

#[cfg(target_os = "windows")]
fn primary_image_info(handle: HANDLE) -> Result<(Address, u64)> {
    let mut modules = [windows::Win32::Foundation::HMODULE::default(); 1024];
    let mut needed: u32 = 0;

    // SAFETY: EnumProcessModulesEx is called with a valid process handle and
    // a module array large enough for typical module counts; needed receives
    // the byte count actually required.
    unsafe {
        EnumProcessModulesEx(
            handle,
            modules.as_mut_ptr(),
            (modules.len() * std::mem::size_of::<windows::Win32::Foundation::HMODULE>()) as u32,
            &mut needed,
            LIST_MODULES_ALL,
        )
        .map_err(|e| Error::ProcessOpenFailed(format!("Failed to enumerate modules: {}", e)))?;
    }

    if needed == 0 {
        return Err(Error::ProcessOpenFailed(
            "No modules found in process".to_string(),
        ));
    }

    let mut info = MODULEINFO::default();
    // SAFETY: GetModuleInformation is called with a valid process handle and
    // the first module handle from the enumeration; info is properly sized.
    unsafe {
        GetModuleInformation(
            handle,
            modules[0],
            &mut info,
            std::mem::size_of::<MODULEINFO>() as u32,
        )
        .map_err(|e| Error::ProcessOpenFailed(format!("Failed to get module info: {}", e)))?;
    }

    Ok((
        Address::new(info.lpBaseOfDll as u64),
        info.SizeOfImage as u64,
    ))
}
