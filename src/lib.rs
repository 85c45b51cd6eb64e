//! # sandlaunch
//!
//! Runs an untrusted program as a restricted user, under resource limits
//! and a wall-clock watchdog, and reports how it ended as one exit code.

pub mod runtime;
pub mod verdict;


pub use runtime::{ExecutionRequest, LauncherConfig, Outcome, Supervision};
#[cfg(target_os = "linux")]
pub use runtime::{launch, launch_as, run};
pub use verdict::Verdict;
