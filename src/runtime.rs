// SPDX-License-Identifier: MIT

//! Manages the runtime execution of the child process.
//!
//! The `launch` function is the main entry point.  It takes an
//! `ExecutionRequest` that describes the target command, its limits and
//! its redirections, and a `LauncherConfig` naming the restricted identity.
//! The child redirects its streams, drops to that identity, lowers its
//! resource limits and becomes the target program, while the parent waits
//! under a wall-clock watchdog.  `run` additionally turns the result into
//! the launcher's exit code.

pub mod config;
pub mod error;
pub mod request;
pub mod spawn;
pub mod status;

pub use config::{Credentials, Identity, LauncherConfig};
pub use request::ExecutionRequest;
pub use spawn::{Outcome, Supervision};

#[cfg(target_os = "linux")]
mod spawn_linux;

/// Launch and supervise the target as the configured restricted identity.
#[cfg(target_os = "linux")]
pub fn launch(
    request: &ExecutionRequest,
    config: &LauncherConfig,
) -> Result<Supervision, error::LaunchError> {
    let creds = config.resolve_credentials()?;
    launch_as(request, creds, config.watchdog_grace)
}

/// Launch and supervise the target as an already resolved identity.
#[cfg(target_os = "linux")]
pub fn launch_as(
    request: &ExecutionRequest,
    creds: Credentials,
    watchdog_grace: std::time::Duration,
) -> Result<Supervision, error::LaunchError> {
    if !nix::unistd::geteuid().is_root() && nix::unistd::geteuid().as_raw() != creds.uid {
        log::warn!(
            "running without privilege; the drop to uid {} is expected to fail",
            creds.uid
        );
    }
    let pid = spawn_linux::launch_child(request, creds)?;
    let deadline = std::time::Duration::from_secs(request.time_limit_sec).saturating_add(watchdog_grace);
    spawn_linux::supervise(pid, deadline)
}

/// Launch, supervise and translate into the outward exit code.
#[cfg(target_os = "linux")]
pub fn run(request: &ExecutionRequest, config: &LauncherConfig) -> Result<i32, error::LaunchError> {
    let supervision = launch(request, config)?;
    let mut log = status::DebugLog::open(request.debug, &config.debug_log);
    Ok(status::translate(
        &supervision,
        request.program().unwrap_or_default(),
        &mut log,
    ))
}

/// The launcher's own exit code for a finished run.  Failures of the
/// launcher itself are logged and reported as [`spawn::LAUNCHER_FAILURE`].
pub fn exit_code(result: Result<i32, error::LaunchError>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            spawn::LAUNCHER_FAILURE
        }
    }
}
