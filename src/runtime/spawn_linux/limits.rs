// SPDX-License-Identifier: MIT

//! Resource limits applied to the child after the identity drop.
//!
//! An unprivileged process may always lower its own limits, so applying
//! them after the drop needs no privilege.  Every limit sets the soft and
//! hard cap together; only the CPU limit leaves a one second gap so the
//! kernel's SIGXCPU arrives before the hard cap forces a SIGKILL.

use nix::sys::resource::{setrlimit, Resource};
use nix::libc::rlim_t;

use crate::runtime::{request::ExecutionRequest, spawn_linux::child::ChildError};

const MEGABYTE: rlim_t = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Processes the restricted user may own; zero blocks fork.
    pub processes: rlim_t,
    pub address_space_bytes: rlim_t,
    pub cpu_soft_sec: rlim_t,
    pub cpu_hard_sec: rlim_t,
    pub file_size_bytes: rlim_t,
}

impl ResourceLimits {
    pub fn from_request(request: &ExecutionRequest) -> Self {
        ResourceLimits {
            processes: 0,
            address_space_bytes: request.memory_limit_mb.saturating_mul(MEGABYTE),
            cpu_soft_sec: request.time_limit_sec,
            cpu_hard_sec: request.time_limit_sec.saturating_add(1),
            file_size_bytes: request.max_file_size_mb.saturating_mul(MEGABYTE),
        }
    }

    /// Called by the child after the identity drop.  The order is fixed:
    /// processes, address space, CPU time, file size.
    pub fn child_after_fork(&self) -> Result<(), ChildError> {
        setrlimit(Resource::RLIMIT_NPROC, self.processes, self.processes)
            .map_err(|e| ChildError::new("limit processes", e))?;
        setrlimit(
            Resource::RLIMIT_AS,
            self.address_space_bytes,
            self.address_space_bytes,
        )
        .map_err(|e| ChildError::new("limit address space", e))?;
        setrlimit(Resource::RLIMIT_CPU, self.cpu_soft_sec, self.cpu_hard_sec)
            .map_err(|e| ChildError::new("limit cpu time", e))?;
        setrlimit(
            Resource::RLIMIT_FSIZE,
            self.file_size_bytes,
            self.file_size_bytes,
        )
        .map_err(|e| ChildError::new("limit file size", e))?;
        Ok(())
    }
}
