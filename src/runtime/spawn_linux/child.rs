// SPDX-License-Identifier: MIT

//! Failure reporting from inside the forked child.
//!
//! Nothing here may allocate: the parent may have other threads, and the
//! child runs with whatever heap state the fork captured.  Messages are
//! written straight to FD 2, which by then may already be the configured
//! error file.

use nix::errno::Errno;

/// One failed step of the child's setup.
#[derive(Debug, Clone, Copy)]
pub struct ChildError {
    pub step: &'static str,
    pub errno: Errno,
}

impl ChildError {
    pub fn new(step: &'static str, errno: Errno) -> Self {
        ChildError { step, errno }
    }

    /// Capture `errno` from the libc call that just failed.
    pub fn last(step: &'static str) -> Self {
        ChildError::new(step, Errno::last())
    }
}

/// Report the error and terminate the child with `code`.
pub fn exit_with_error(err: ChildError, code: i32) -> ! {
    write_stderr(b"sandlaunch: ");
    write_stderr(err.step.as_bytes());
    write_stderr(b": ");
    write_stderr(err.errno.desc().as_bytes());
    write_stderr(b"\n");
    exit_with(code)
}

pub fn exit_with(code: i32) -> ! {
    unsafe { nix::libc::_exit(code) }
}

fn write_stderr(buf: &[u8]) {
    // Ignore errors; there is nowhere else to report them.
    let _ = unsafe { nix::libc::write(2, buf.as_ptr().cast(), buf.len()) };
}
