// SPDX-License-Identifier: MIT

//! Permanently drop the child to the restricted identity.
//!
//! Groups go first: once the user id changes, the process no longer has
//! the privilege to change its groups.  Real, effective and saved ids are
//! all replaced, so the target cannot switch back.

use nix::unistd::{geteuid, getuid, setgroups, setresgid, setresuid, Gid, Uid};

use crate::runtime::{config::Credentials, spawn_linux::child::ChildError};

/// The identity drop, prepared before the fork.
#[derive(Debug, Clone, Copy)]
pub struct IdentityDrop {
    uid: Uid,
    gid: Gid,
    /// Clearing supplementary groups needs privilege.  A launcher that is
    /// already running as the restricted user has none to clear.
    clear_groups: bool,
}

impl IdentityDrop {
    pub fn new(creds: Credentials) -> Self {
        let uid = Uid::from_raw(creds.uid);
        IdentityDrop {
            uid,
            gid: Gid::from_raw(creds.gid),
            clear_groups: !(getuid() == uid && geteuid() == uid),
        }
    }

    /// Called by the child after the streams are redirected.
    pub fn child_after_fork(&self) -> Result<(), ChildError> {
        if self.clear_groups {
            setgroups(&[]).map_err(|e| ChildError::new("clear supplementary groups", e))?;
        }
        setresgid(self.gid, self.gid, self.gid).map_err(|e| ChildError::new("setresgid", e))?;
        setresuid(self.uid, self.uid, self.uid).map_err(|e| ChildError::new("setresuid", e))?;
        if geteuid() != self.uid || getuid() != self.uid {
            return Err(ChildError::new("verify identity", nix::errno::Errno::EPERM));
        }
        Ok(())
    }
}
