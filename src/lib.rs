//! Scramble strings out of a running process's memory.
//!
//! Given a pid and a set of literal byte patterns, this crate stops the
//! target with ptrace, walks the writable regions of its address space, and
//! overwrites every occurrence of any pattern with a filler byte. The target
//! is resumed on every exit path, including errors. Useful for scrubbing
//! credentials or other sensitive strings from a live process; the
//! overwrite is destructive and one-directional.
//!
//! Requires the same privileges as attaching a debugger to the target
//! (typically root, or a direct child under Yama's default ptrace scope).

mod error;
mod memory_protection;
mod memory_region;
mod patcher;
mod ptrace;
mod region_map;

pub use error::{Error, Result};
pub use memory_protection::MemoryProtection;
pub use memory_region::MemoryRegion;
pub use patcher::{Match, MemoryPatcher, PatternSet, ScrambleReport, FILLER_BYTE};
pub use ptrace::TracedProcess;
pub use region_map::{parse_maps, writable_regions};

/// Stops the target, scrambles every match of `patterns` in its writable
/// memory, and resumes it.
///
/// Attach failures are fatal and leave the target untouched. Detach is
/// attempted exactly once regardless of how the scan went; if both the scan
/// and the detach fail, the scan error wins and the detach failure is
/// logged.
pub fn scramble(pid: i32, patterns: &PatternSet) -> Result<ScrambleReport> {
    let traced = TracedProcess::attach(pid)?;

    let outcome = MemoryPatcher::new(&traced).scramble(patterns);

    match traced.detach() {
        Ok(()) => outcome,
        Err(detach_err) => match outcome {
            Ok(_) => Err(detach_err),
            Err(scan_err) => {
                log::error!("{detach_err}");
                Err(scan_err)
            }
        },
    }
}
