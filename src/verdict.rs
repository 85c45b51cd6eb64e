// SPDX-License-Identifier: MIT

//! Reading the launcher's exit code back into a judging verdict.
//!
//! This is how a grading caller interprets the code.  It inherits the
//! ambiguity of the code itself: a target that exits with 9 reads as
//! `Killed`.

use std::fmt::Display;

use crate::runtime::spawn::EXEC_FAILURE;

const SIGABRT: i32 = 6;
const SIGFPE: i32 = 8;
const SIGKILL: i32 = 9;
const SIGSEGV: i32 = 11;
const SIGXCPU: i32 = 24;
const SIGXFSZ: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Clean run; the output still has to be checked.
    Run,
    /// The target program never started.
    ExecFailed,
    TimeLimit,
    OutputLimit,
    Segfault,
    FloatingPoint,
    /// Killed by the watchdog or by anything else sending SIGKILL.
    Killed,
    Aborted,
    RuntimeError,
}

impl Verdict {
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => Verdict::Run,
            EXEC_FAILURE => Verdict::ExecFailed,
            SIGXCPU => Verdict::TimeLimit,
            SIGXFSZ => Verdict::OutputLimit,
            SIGSEGV => Verdict::Segfault,
            SIGFPE => Verdict::FloatingPoint,
            SIGKILL => Verdict::Killed,
            SIGABRT => Verdict::Aborted,
            _ => Verdict::RuntimeError,
        }
    }

    /// Short code as used on a results board.
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Run => "RUN",
            Verdict::ExecFailed => "EXEC",
            Verdict::TimeLimit => "TLE",
            Verdict::OutputLimit => "OUTE",
            Verdict::Segfault => "SEG",
            Verdict::FloatingPoint => "FPE",
            Verdict::Killed => "KILL",
            Verdict::Aborted => "ABRT",
            Verdict::RuntimeError => "RTE",
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
