// SPDX-License-Identifier: MIT

//! Launcher settings that are fixed for an installation rather than passed
//! per call: which account the target runs as, where debug lines go, and
//! how long the watchdog waits past the CPU limit.

use std::{path::PathBuf, time::Duration};

use crate::runtime::error::LaunchError;

/// Account used when the build does not name one.
pub const DEFAULT_USER: &str = "nobody";

/// Shared append-only file for debug lines.
pub const DEFAULT_DEBUG_LOG: &str = "/tmp/setuid-helper.debug";

/// Wall-clock allowance beyond the CPU limit, for time spent off the CPU.
pub const DEFAULT_WATCHDOG_GRACE: Duration = Duration::from_secs(2);

/// The unprivileged account the target runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Name(String),
    Id(u32),
}

impl Identity {
    /// A purely numeric value is an id; anything else is an account name.
    pub fn parse(value: &str) -> Self {
        match value.parse::<u32>() {
            Ok(id) => Identity::Id(id),
            Err(_) => Identity::Name(value.to_string()),
        }
    }
}

/// A resolved, non-root identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub uid: u32,
    pub gid: u32,
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub restricted_user: Identity,
    pub debug_log: PathBuf,
    pub watchdog_grace: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            restricted_user: Identity::parse(option_env!("SANDLAUNCH_USER").unwrap_or(DEFAULT_USER)),
            debug_log: PathBuf::from(option_env!("SANDLAUNCH_DEBUG_LOG").unwrap_or(DEFAULT_DEBUG_LOG)),
            watchdog_grace: DEFAULT_WATCHDOG_GRACE,
        }
    }
}

impl LauncherConfig {
    /// Look the restricted identity up in the password database.
    #[cfg(target_os = "linux")]
    pub fn resolve_credentials(&self) -> Result<Credentials, LaunchError> {
        use nix::unistd::{Uid, User};

        let creds = match &self.restricted_user {
            Identity::Name(name) => match User::from_name(name)? {
                Some(user) => Credentials {
                    uid: user.uid.as_raw(),
                    gid: user.gid.as_raw(),
                },
                None => {
                    return Err(LaunchError::Config(format!(
                        "restricted user {name:?} does not exist"
                    )));
                }
            },
            // An id need not have a database entry.
            Identity::Id(id) => match User::from_uid(Uid::from_raw(*id))? {
                Some(user) => Credentials {
                    uid: user.uid.as_raw(),
                    gid: user.gid.as_raw(),
                },
                None => Credentials { uid: *id, gid: *id },
            },
        };
        validate_credentials(creds)
    }
}

/// Refuse to "drop" to root.
pub fn validate_credentials(creds: Credentials) -> Result<Credentials, LaunchError> {
    if creds.uid == 0 || creds.gid == 0 {
        return Err(LaunchError::Config(format!(
            "restricted identity must not be root (uid={}, gid={})",
            creds.uid, creds.gid
        )));
    }
    Ok(creds)
}
