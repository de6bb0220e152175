//! Attachment lifecycle.
//!
//! A `Session` binds the runtime to at most one target process. Attaching
//! again replaces the previous attachment wholesale, releasing its handle;
//! addresses resolved against the old target are meaningless afterwards and
//! the caller must re-resolve them. Liveness is poll-only: the host loop
//! calls `did_exit()` each tick, nothing is pushed.

use tracing::{debug, info};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::process::{ModuleInfo, ProcessHandle, ProcessMemory};
use crate::scan::{self, Signature};

/// Attach-time options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachOptions {
    /// Treat the target's paging structures as untrustworthy: route every
    /// transfer through the page-checked path, which validates each page
    /// mapping through the OS before copying. Slower, but immune to bulk
    /// copies tearing across remapped pages.
    pub corrupt_page_tables: bool,
}

/// The live attachment state, or the lack of one.
#[derive(Default)]
pub struct Session {
    memory: Option<ProcessMemory>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to a process by pid.
    pub fn attach_pid(&mut self, pid: u32, options: AttachOptions) -> Result<()> {
        let handle = ProcessHandle::open(pid)?;
        self.install(handle, options);
        Ok(())
    }

    /// Attach to the first process with the given executable name.
    pub fn attach_name(&mut self, name: &str, options: AttachOptions) -> Result<()> {
        let handle = ProcessHandle::find_by_name(name)?;
        self.install(handle, options);
        Ok(())
    }

    /// Attach to the process owning a top-level window matched by class
    /// and/or title.
    pub fn attach_window(
        &mut self,
        class: Option<&str>,
        title: Option<&str>,
        options: AttachOptions,
    ) -> Result<()> {
        let handle = ProcessHandle::find_by_window(class, title)?;
        self.install(handle, options);
        Ok(())
    }

    fn install(&mut self, handle: ProcessHandle, options: AttachOptions) {
        if let Some(previous) = self.memory.take() {
            debug!(
                "Replacing attachment to PID {} with PID {}",
                previous.process().pid(),
                handle.pid()
            );
        }
        info!(
            "Attached to PID {} (base: {}, image: {:#x} bytes)",
            handle.pid(),
            handle.base_address(),
            handle.base_size()
        );
        self.memory = Some(ProcessMemory::new(handle, options.corrupt_page_tables));
    }

    /// Release the current attachment, if any.
    pub fn detach(&mut self) {
        if let Some(previous) = self.memory.take() {
            debug!("Detached from PID {}", previous.process().pid());
        }
    }

    pub fn is_attached(&self) -> bool {
        self.memory.is_some()
    }

    /// Whether the attached process has exited. Poll this each tick; a
    /// detached session reports `false`.
    pub fn did_exit(&self) -> bool {
        self.memory
            .as_ref()
            .is_some_and(|m| !m.process().is_alive())
    }

    pub fn pid(&self) -> Result<u32> {
        Ok(self.memory()?.process().pid())
    }

    /// Address of the target's Process Environment Block.
    pub fn peb(&self) -> Result<Address> {
        Ok(self.memory()?.process().peb())
    }

    /// Base address of the target's primary executable image.
    pub fn base_address(&self) -> Result<Address> {
        Ok(self.memory()?.process().base_address())
    }

    /// The attached address space, or the not-attached error.
    pub fn memory(&self) -> Result<&ProcessMemory> {
        self.memory.as_ref().ok_or(Error::NotAttached)
    }

    pub fn base_module(&self) -> Result<ModuleInfo> {
        self.memory()?.process().base_module()
    }

    pub fn find_module(&self, name: &str) -> Result<Option<ModuleInfo>> {
        self.memory()?.process().find_module(name)
    }

    /// Scan `[start, start + size)` of the attached process for a signature.
    pub fn find_signature(
        &self,
        start: Address,
        size: u64,
        signature: &Signature,
    ) -> Result<Option<Address>> {
        Ok(scan::find_signature(self.memory()?, start, size, signature))
    }
}
