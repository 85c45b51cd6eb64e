// SPDX-License-Identifier: MIT

//! Spawns the process with its identity dropped and resource limits set.
//! Specific to Linux.

mod child;
mod fd;
mod identity;
mod launch;
mod limits;
mod watchdog;

pub(crate) use launch::launch_child;
pub(crate) use watchdog::supervise;
