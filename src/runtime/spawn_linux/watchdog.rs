// SPDX-License-Identifier: MIT

//! Parent-side supervision of the launched child.
//!
//! The watchdog is a thread that owns the child's pid and a disarm channel.
//! If the deadline passes before it is disarmed, the child is killed hard.
//! The parent waits without reaping, so the pid stays reserved until the
//! watchdog is joined and cannot be reused by an unrelated process.

use std::{
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread::JoinHandle,
    time::Duration,
};

use nix::{
    errno::Errno,
    sys::{
        signal::{kill, Signal},
        wait::{waitid, Id, WaitPidFlag},
    },
    unistd::Pid,
};

use crate::runtime::{
    error::LaunchError,
    spawn::{Outcome, Supervision},
};

pub struct Watchdog {
    disarm: Sender<()>,
    handle: JoinHandle<bool>,
}

impl Watchdog {
    /// Start the one-shot deadline timer for `pid`.
    pub fn arm(pid: Pid, deadline: Duration) -> Result<Self, LaunchError> {
        let (disarm, disarmed) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("watchdog".to_string())
            .spawn(move || match disarmed.recv_timeout(deadline) {
                Err(RecvTimeoutError::Timeout) => {
                    // No grace period; the child may ignore anything softer.
                    match kill(pid, Signal::SIGKILL) {
                        Ok(()) => log::debug!("watchdog killed child {pid} after {deadline:?}"),
                        Err(e) => log::debug!("watchdog could not kill child {pid}: {e}"),
                    }
                    true
                }
                // Disarmed, or the supervisor went away.
                _ => false,
            })?;
        Ok(Watchdog { disarm, handle })
    }

    /// Stop the timer.  Returns true if it had already fired.
    pub fn disarm(self) -> bool {
        let _ = self.disarm.send(());
        self.handle.join().unwrap_or(false)
    }
}

/// Wait for the child under a watchdog, then reap it and classify its status.
pub fn supervise(pid: Pid, deadline: Duration) -> Result<Supervision, LaunchError> {
    let watchdog = match Watchdog::arm(pid, deadline) {
        Ok(w) => w,
        Err(e) => {
            abandon(pid);
            return Err(e);
        }
    };
    log::debug!("supervising child {pid} with a {deadline:?} deadline");

    let waited = waitid(Id::Pid(pid), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT);
    let fired = watchdog.disarm();
    if let Err(e) = waited {
        abandon(pid);
        return Err(LaunchError::Process(format!("waiting for child {pid}: {e}")));
    }

    let raw_status = reap(pid)?;
    let outcome = Outcome::from_raw(raw_status);
    let timed_out = killed_by_watchdog(fired, outcome);
    log::debug!("child {pid} finished: {outcome} (timed out: {timed_out})");
    Ok(Supervision {
        raw_status,
        outcome,
        timed_out,
    })
}

/// The watchdog can fire between the child's exit and the disarm.  Its kill
/// then hits a zombie, and the run did not time out.
fn killed_by_watchdog(fired: bool, outcome: Outcome) -> bool {
    fired && outcome == Outcome::Signaled(Signal::SIGKILL as i32)
}

/// Collect the raw wait status of an already terminated child.
fn reap(pid: Pid) -> Result<i32, LaunchError> {
    let mut status: nix::libc::c_int = 0;
    let res = unsafe { nix::libc::waitpid(pid.as_raw(), &mut status, 0) };
    if res < 0 {
        return Err(LaunchError::Process(format!(
            "reaping child {pid}: {}",
            Errno::last()
        )));
    }
    Ok(status)
}

/// Supervision failed; make sure the child does not outlive the launcher.
fn abandon(pid: Pid) {
    if let Err(e) = kill(pid, Signal::SIGKILL) {
        log::warn!("failed terminating child {pid}: {e}");
    }
    let _ = reap(pid);
}
