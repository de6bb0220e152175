use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No process attached")]
    NotAttached,

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Window not found: {0}")]
    WindowNotFound(String),

    #[error("Architecture mismatch: process {pid} is not a 64-bit target")]
    ArchitectureMismatch { pid: u32 },

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Invalid buffer handle: {0}")]
    InvalidHandle(u64),

    #[error("Buffer access out of bounds: offset {offset} + {len} exceeds size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("Invalid signature pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
