// SPDX-License-Identifier: MIT

//! Common error type.
//!

use std::ffi::NulError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{field} path is {len} bytes, longer than the {max} byte maximum")]
    PathTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("process error: {0}")]
    Process(String),
}

impl From<NulError> for LaunchError {
    fn from(e: NulError) -> Self {
        LaunchError::Io(std::io::Error::new(std::io::ErrorKind::InvalidFilename, e))
    }
}

#[cfg(target_os = "linux")]
impl From<nix::Error> for LaunchError {
    fn from(e: nix::Error) -> Self {
        LaunchError::Io(e.into())
    }
}
