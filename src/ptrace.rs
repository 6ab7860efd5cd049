use std::io;
use std::ptr;

use crate::error::{Error, Result};

/// A process held in the ptrace-stopped state.
///
/// Attaching stops the target and confirms the stop before returning, so
/// holding a `TracedProcess` is proof that the target is not executing.
/// Detach happens exactly once: either explicitly through
/// [`TracedProcess::detach`], which reports the outcome, or as a best-effort
/// fallback when the value is dropped on an error path. Either way the
/// target is never left frozen.
#[derive(Debug)]
pub struct TracedProcess {
    pid: libc::pid_t,
    detached: bool,
}

impl TracedProcess {
    /// Attaches to the target with `PTRACE_ATTACH` and waits for it to
    /// report the resulting SIGSTOP.
    ///
    /// Fails if the request is rejected (no such process, no permission) or
    /// if the wait does not observe a stop caused by SIGSTOP. In the latter
    /// cases a detach is still attempted so a half-attached target is not
    /// left behind.
    pub fn attach(pid: i32) -> Result<Self> {
        let rv = unsafe {
            libc::ptrace(
                libc::PTRACE_ATTACH,
                pid,
                ptr::null_mut::<libc::c_void>(),
                ptr::null_mut::<libc::c_void>(),
            )
        };
        if rv < 0 {
            return Err(Error::Attach {
                pid,
                source: io::Error::last_os_error(),
            });
        }

        let mut status = 0;
        if unsafe { libc::waitpid(pid, &mut status, 0) } < 0 {
            let source = io::Error::last_os_error();
            Self::detach_raw(pid);
            return Err(Error::AwaitStop { pid, source });
        }

        if !libc::WIFSTOPPED(status) {
            Self::detach_raw(pid);
            return Err(Error::NotStopped { pid });
        }

        let signal = libc::WSTOPSIG(status);
        if signal != libc::SIGSTOP {
            Self::detach_raw(pid);
            return Err(Error::UnexpectedStopSignal { pid, signal });
        }

        Ok(Self {
            pid,
            detached: false,
        })
    }

    /// Process identifier of the stopped target.
    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Resumes the target with `PTRACE_DETACH`, reporting the outcome.
    pub fn detach(mut self) -> Result<()> {
        self.detached = true;
        if Self::detach_raw(self.pid) < 0 {
            return Err(Error::Detach {
                pid: self.pid,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn detach_raw(pid: libc::pid_t) -> libc::c_long {
        unsafe {
            libc::ptrace(
                libc::PTRACE_DETACH,
                pid,
                ptr::null_mut::<libc::c_void>(),
                ptr::null_mut::<libc::c_void>(),
            )
        }
    }
}

impl Drop for TracedProcess {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        // Error-path release. The explicit detach() consumes self, so this
        // only runs when an error propagated past the caller.
        if Self::detach_raw(self.pid) < 0 {
            log::error!(
                "failed to detach from pid {}: {}",
                self.pid,
                io::Error::last_os_error()
            );
        }
    }
}
