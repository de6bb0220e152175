pub mod address;
pub mod buffer;
pub mod error;
pub mod process;
pub mod scan;
pub mod session;
pub mod strings;

pub use address::Address;
pub use buffer::{BufferHandle, BufferPool};
pub use error::{Error, Result};
pub use process::{ModuleInfo, ProcessHandle, ProcessMemory, ReadMemory, WriteMemory};
pub use scan::{
    Signature, SignatureEntry, SignatureSet, find_signature, load_signature_set,
    save_signature_set,
};
pub use session::{AttachOptions, Session};
