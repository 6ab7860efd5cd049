use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while attaching to, mapping, or patching a target process.
///
/// Attach-side variants are fatal: no memory of the target is touched unless
/// the stop was confirmed. Read/write variants are recovered or surfaced per
/// region by the patcher.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to attach to pid {pid}: {source}")]
    Attach {
        pid: i32,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for pid {pid} to stop: {source}")]
    AwaitStop {
        pid: i32,
        #[source]
        source: io::Error,
    },

    #[error("pid {pid} did not enter a stopped state (it may have exited)")]
    NotStopped { pid: i32 },

    #[error("pid {pid} stopped with unexpected signal {signal}, expected SIGSTOP")]
    UnexpectedStopSignal { pid: i32, signal: i32 },

    #[error("failed to detach from pid {pid}: {source}")]
    Detach {
        pid: i32,
        #[source]
        source: io::Error,
    },

    #[error("failed to read memory maps of pid {pid}: {source}")]
    Maps {
        pid: i32,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {length} bytes at {address:#x}: {source}")]
    Read {
        address: usize,
        length: usize,
        #[source]
        source: io::Error,
    },

    #[error("short read at {address:#x}: got {got} of {expected} bytes")]
    ShortRead {
        address: usize,
        expected: usize,
        got: usize,
    },

    #[error("failed to write {length} bytes at {address:#x}: {source}")]
    Write {
        address: usize,
        length: usize,
        #[source]
        source: io::Error,
    },

    #[error("short write at {address:#x}: wrote {got} of {expected} bytes")]
    ShortWrite {
        address: usize,
        expected: usize,
        got: usize,
    },

    #[error("pattern set must contain at least one non-empty pattern")]
    EmptyPattern,

    #[error("failed to compile pattern set: {0}")]
    Pattern(#[from] regex::Error),
}
