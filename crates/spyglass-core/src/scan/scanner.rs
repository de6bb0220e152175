//! Gap-tolerant signature scanning.
//!
//! The scanner walks `[start, start + size)` in large chunks. An unreadable
//! sub-range is a scan obstacle, not a failure: the failed chunk is retried
//! page by page, unreadable pages end the current contiguous run, and
//! matching resumes at the next readable page. A pattern therefore never
//! matches across a gap, and the first match is always the lowest address.

use tracing::debug;

use crate::address::Address;
use crate::process::{PAGE_SIZE, ReadMemory};
use crate::scan::Signature;

/// Chunk size for scan reads (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Hard cap on a single scan so one call cannot stall the host tick
/// indefinitely (256 MiB).
pub const MAX_SCAN_SIZE: u64 = 256 * 1024 * 1024;

/// Find the first occurrence of `signature` in `[start, start + size)`.
///
/// Returns `None` when the pattern is absent; an address is never conflated
/// with a zero sentinel.
pub fn find_signature<R: ReadMemory>(
    reader: &R,
    start: Address,
    size: u64,
    signature: &Signature,
) -> Option<Address> {
    if signature.is_empty() || size == 0 {
        return None;
    }

    let size = if size > MAX_SCAN_SIZE {
        debug!(
            "Scan of {} bytes at {} clamped to {} bytes",
            size, start, MAX_SCAN_SIZE
        );
        MAX_SCAN_SIZE
    } else {
        size
    };

    let end = start.get().saturating_add(size);
    // Bytes that must survive a drain so a match straddling the boundary of
    // two searched stretches is still found.
    let keep = signature.len() - 1;

    let mut run: Vec<u8> = Vec::new();
    let mut run_start = start.get();
    let mut cursor = start.get();

    while cursor < end {
        let want = DEFAULT_CHUNK_SIZE.min((end - cursor) as usize);
        match reader.read_bytes(Address::new(cursor), want) {
            Ok(data) => {
                if run.is_empty() {
                    run_start = cursor;
                }
                run.extend_from_slice(&data);
                cursor += want as u64;
            }
            Err(_) => {
                // Retry the failed chunk page by page; each unreadable page
                // closes the current run.
                let chunk_end = cursor + want as u64;
                while cursor < chunk_end {
                    let page_len = (PAGE_SIZE - cursor % PAGE_SIZE).min(chunk_end - cursor) as usize;
                    match reader.read_bytes(Address::new(cursor), page_len) {
                        Ok(data) => {
                            if run.is_empty() {
                                run_start = cursor;
                            }
                            run.extend_from_slice(&data);
                        }
                        Err(_) => {
                            if let Some(hit) = search_run(&run, run_start, signature) {
                                return Some(hit);
                            }
                            run.clear();
                        }
                    }
                    cursor += page_len as u64;
                }
            }
        }

        // Bound run growth: search what has accumulated, then retain only the
        // overlap tail. Positions in the tail have not been fully checked yet.
        if run.len() >= DEFAULT_CHUNK_SIZE * 2 {
            if let Some(hit) = search_run(&run, run_start, signature) {
                return Some(hit);
            }
            let drained = run.len() - keep;
            run.drain(..drained);
            run_start += drained as u64;
        }
    }

    search_run(&run, run_start, signature)
}

fn search_run(run: &[u8], run_start: u64, signature: &Signature) -> Option<Address> {
    signature
        .find_in(run)
        .map(|offset| Address::new(run_start + offset as u64))
}
