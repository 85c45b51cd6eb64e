// SPDX-License-Identifier: MIT

//! Turns the supervised child's termination into the launcher's exit code.
//!
//! In debug mode every observed state is also appended to a shared log
//! file.  That log is best effort: nothing that goes wrong with it changes
//! the exit code.

use std::{
    ffi::OsStr,
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

use crate::{
    runtime::spawn::{Outcome, Supervision},
    verdict::Verdict,
};

/// Append-only diagnostic log, shared by every launcher instance.
pub struct DebugLog {
    file: Option<File>,
}

impl DebugLog {
    /// Open the log when `enabled`; otherwise every record is dropped.
    pub fn open(enabled: bool, path: &Path) -> Self {
        if !enabled {
            return DebugLog::disabled();
        }
        match OpenOptions::new().append(true).create(true).open(path) {
            Ok(file) => DebugLog { file: Some(file) },
            Err(e) => {
                log::warn!("cannot open debug log {}: {e}", path.display());
                DebugLog::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        DebugLog { file: None }
    }

    /// Append one line.
    pub fn record(&mut self, line: std::fmt::Arguments<'_>) {
        if let Some(file) = &mut self.file {
            // Each line goes out in a single write so concurrent launchers
            // don't interleave within a line.
            let text = format!("{line}\n");
            if let Err(e) = file.write_all(text.as_bytes()) {
                log::debug!("debug log write failed: {e}");
            }
        }
    }
}

/// Log the supervision result and return the outward exit code.
pub fn translate(supervision: &Supervision, program: &OsStr, log: &mut DebugLog) -> i32 {
    let program = program.to_string_lossy();
    log.record(format_args!(
        "submission {program} status = {}",
        supervision.raw_status
    ));
    if supervision.timed_out {
        log.record(format_args!("submission {program} hit the wall-clock deadline"));
    }
    match supervision.outcome {
        Outcome::Signaled(_) => {
            log.record(format_args!("submission {program} {}", supervision.outcome))
        }
        Outcome::Exited(_) | Outcome::Abnormal(_) => {
            log.record(format_args!("child {program} {}", supervision.outcome))
        }
    }
    let code = supervision.outcome.exit_code();
    log.record(format_args!(
        "submission {program} verdict = {}",
        Verdict::from_exit_code(code)
    ));
    code
}
