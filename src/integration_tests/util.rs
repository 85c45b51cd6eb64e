//! Utility helpers for running the tests.

use std::{ffi::OsString, path::PathBuf, time::Duration};

use nix::unistd::{getgid, geteuid, getuid};
use tempfile::TempDir;

use crate::runtime::{
    config::Credentials,
    request::{BoundedPath, ExecutionRequest},
    spawn::Supervision,
};

/// The account used for root test runs.
pub const NOBODY: u32 = 65534;

pub fn is_root() -> bool {
    geteuid().is_root()
}

/// Identity the target should end up with.
pub fn credentials() -> Credentials {
    if is_root() {
        Credentials { uid: NOBODY, gid: NOBODY }
    } else {
        Credentials {
            uid: getuid().as_raw(),
            gid: getgid().as_raw(),
        }
    }
}

/// A directory holding the three redirection files for one launch.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new(stdin: &str) -> Self {
        let dir = tempfile::tempdir().expect("create scratch dir");
        std::fs::write(dir.path().join("in"), stdin).expect("write input file");
        Scratch { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn stdout(&self) -> String {
        std::fs::read_to_string(self.path("out")).unwrap_or_default()
    }

    pub fn stderr(&self) -> String {
        std::fs::read_to_string(self.path("err")).unwrap_or_default()
    }

    pub fn request(&self, time_limit_sec: u64, memory_limit_mb: u64, cmd: &[&str]) -> ExecutionRequest {
        ExecutionRequest {
            debug: false,
            memory_limit_mb,
            time_limit_sec,
            max_file_size_mb: 4,
            stdin_path: BoundedPath::new("infile", self.path("in")).unwrap(),
            stdout_path: BoundedPath::new("outfile", self.path("out")).unwrap(),
            stderr_path: BoundedPath::new("errfile", self.path("err")).unwrap(),
            target_command: cmd.iter().map(OsString::from).collect(),
        }
    }
}

/// Launch as the test identity with the standard two second grace.
pub fn launch(request: &ExecutionRequest) -> Supervision {
    crate::runtime::launch_as(request, credentials(), Duration::from_secs(2))
        .expect("launch and supervise")
}
