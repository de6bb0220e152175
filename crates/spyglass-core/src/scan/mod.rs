pub mod scanner;
pub mod signature;

pub use scanner::{DEFAULT_CHUNK_SIZE, MAX_SCAN_SIZE, find_signature};
pub use signature::{
    Signature, SignatureEntry, SignatureSet, load_signature_set, save_signature_set,
};
