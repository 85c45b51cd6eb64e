// SPDX-License-Identifier: MIT

//! General model for a launched child's termination and the single exit
//! code reported for it.
//!
//! The outward code shares one 0-255 space between four meanings: the
//! target's own exit code, the number of the signal that killed it, a raw
//! wait status, and the launcher's sentinels below.  A target that exits
//! with 111 is indistinguishable from a failed exec.

use std::fmt::Display;

/// The child could not replace itself with the target program.
pub const EXEC_FAILURE: i32 = 111;

/// Redirection, identity drop or a resource limit failed in the child.
pub const SETUP_FAILURE: i32 = 112;

/// The launcher itself failed before or while supervising the child.
pub const LAUNCHER_FAILURE: i32 = 113;

/// How the child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exited(i32),
    Signaled(i32),
    /// Neither exited nor signaled; carries the raw wait status.
    Abnormal(i32),
}

impl Outcome {
    /// Classify a raw wait status.  Signals are checked before exits.
    #[cfg(target_os = "linux")]
    pub fn from_raw(status: i32) -> Self {
        use nix::libc::{WEXITSTATUS, WIFEXITED, WIFSIGNALED, WTERMSIG};

        if WIFSIGNALED(status) {
            Outcome::Signaled(WTERMSIG(status))
        } else if WIFEXITED(status) {
            Outcome::Exited(WEXITSTATUS(status))
        } else {
            Outcome::Abnormal(status)
        }
    }

    /// The value the launcher exits with.
    pub fn exit_code(&self) -> i32 {
        match *self {
            Outcome::Exited(code) => code,
            Outcome::Signaled(sig) => sig,
            Outcome::Abnormal(raw) => raw,
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Exited(code) => write!(f, "exited normally with status = {code}"),
            Outcome::Signaled(sig) => write!(f, "signalled status = {sig}"),
            Outcome::Abnormal(raw) => write!(
                f,
                "did not exit normally and did not get signalled, exited with status = {raw}"
            ),
        }
    }
}

/// Everything the parent observed about one supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Supervision {
    pub raw_status: i32,
    pub outcome: Outcome,
    /// The watchdog's kill is what ended the child.  A kill that lands
    /// after the child already exited does not count.
    pub timed_out: bool,
}
