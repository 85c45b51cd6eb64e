// SPDX-License-Identifier: MIT

//! Redirect the child's standard streams to the configured files.
//!
//! The paths are converted before the fork.  The files are opened in the
//! child while it still holds the launcher's identity, so that the output
//! files can be created wherever the launcher may write.

use std::{ffi::CString, os::unix::ffi::OsStrExt as _};

use nix::libc::{self, c_int, c_uint, dup2};

use crate::runtime::{
    error::LaunchError, request::ExecutionRequest, spawn_linux::child::ChildError,
};

/// Permission bits for created output files, before the umask.
const CREATE_MODE: libc::mode_t = 0o666;

/// Lowest descriptor that is not one of the standard streams.
pub const FIRST_INHERITED_FD: c_int = libc::STDERR_FILENO + 1;

/// One standard stream and the file it reads from or writes to.
struct StreamRedirect {
    dup_to: c_int,
    path: CString,
    flags: c_int,
    step: &'static str,
}

/// The three standard stream redirections, ready to apply after the fork.
pub struct Redirection {
    streams: [StreamRedirect; 3],
}

impl Redirection {
    pub fn new(request: &ExecutionRequest) -> Result<Self, LaunchError> {
        let write_flags = libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC;
        Ok(Redirection {
            streams: [
                StreamRedirect {
                    dup_to: libc::STDIN_FILENO,
                    path: CString::new(request.stdin_path.as_path().as_os_str().as_bytes())?,
                    // The input file must already exist.
                    flags: libc::O_RDONLY,
                    step: "redirect stdin",
                },
                StreamRedirect {
                    dup_to: libc::STDOUT_FILENO,
                    path: CString::new(request.stdout_path.as_path().as_os_str().as_bytes())?,
                    flags: write_flags,
                    step: "redirect stdout",
                },
                StreamRedirect {
                    dup_to: libc::STDERR_FILENO,
                    path: CString::new(request.stderr_path.as_path().as_os_str().as_bytes())?,
                    flags: write_flags,
                    step: "redirect stderr",
                },
            ],
        })
    }

    /// Called by the child process after fork, in stdin, stdout, stderr order.
    /// It must not allocate memory.
    pub fn child_after_fork(&self) -> Result<(), ChildError> {
        for stream in &self.streams {
            stream.apply()?;
        }
        Ok(())
    }
}

impl StreamRedirect {
    fn apply(&self) -> Result<(), ChildError> {
        let fd = unsafe { libc::open(self.path.as_ptr(), self.flags, CREATE_MODE) };
        if fd < 0 {
            return Err(ChildError::last(self.step));
        }
        if fd == self.dup_to {
            // The standard stream was closed, so open() reused its number.
            return Ok(());
        }
        // dup2 returns the new fd (dup_to) on success, and -1 on error.
        let res = unsafe { dup2(fd, self.dup_to) };
        let err = ChildError::last(self.step);
        unsafe { libc::close(fd) };
        if res < 0 { Err(err) } else { Ok(()) }
    }
}

/// Close every descriptor from `first` upward, so nothing the launcher
/// inherited reaches the target.
///
/// `close_range` needs Linux 5.9.  Older kernels fall back to listing
/// `/proc/self/fd`, which allocates.
pub fn close_open_fds(first: c_int) -> Result<(), ChildError> {
    let res = unsafe {
        libc::syscall(
            libc::SYS_close_range,
            first as c_uint,
            c_uint::MAX,
            0 as c_uint,
        )
    };
    if res == 0 {
        return Ok(());
    }
    match nix::errno::Errno::last() {
        nix::errno::Errno::ENOSYS => close_fds_via_proc(first),
        errno => Err(ChildError::new("close inherited descriptors", errno)),
    }
}

/// Close descriptors listed in `/proc/self/fd`.  The listing is collected
/// first, since the directory handle is itself one of the entries.
fn close_fds_via_proc(first: c_int) -> Result<(), ChildError> {
    let step = "list inherited descriptors";
    let fds: Vec<c_int> = match std::fs::read_dir("/proc/self/fd") {
        Ok(entries) => entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .filter(|fd| *fd >= first)
            .collect(),
        Err(e) => {
            let errno = e.raw_os_error().map_or(nix::errno::Errno::EIO, nix::errno::Errno::from_raw);
            return Err(ChildError::new(step, errno));
        }
    };
    for fd in fds {
        // The directory's own descriptor is already closed: EBADF.
        let _ = unsafe { libc::close(fd) };
    }
    Ok(())
}
