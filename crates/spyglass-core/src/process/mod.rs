mod handle;
pub mod memory;
mod module;

// Mock address space for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use handle::ProcessHandle;
pub use memory::{PAGE_SIZE, ProcessMemory, ReadMemory, WriteMemory};
pub use module::ModuleInfo;

// Re-export the mock for convenient access in tests
#[doc(hidden)]
pub use mock::{MockMemory, MockMemoryBuilder};
