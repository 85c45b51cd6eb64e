// SPDX-License-Identifier: MIT

//! Turns the launcher's argument vector into an execution request.
//!
//! The first seven arguments are `name=value` options.  Everything after
//! them is the target command, passed through untouched.  Option names
//! match by prefix in a fixed priority order, so `memlimit_mb=5` is read as
//! `memlimit`.  Tokens that match no option are ignored, and a later
//! duplicate overwrites an earlier one.

use std::{ffi::{OsStr, OsString}, os::unix::ffi::OsStrExt as _, path::PathBuf};

use crate::runtime::error::LaunchError;

/// Number of leading option tokens before the target command.
pub const OPTION_COUNT: usize = 7;

/// Longest accepted redirection path, in bytes.
pub const MAX_PATH_LEN: usize = 299;

/// Option names, in matching priority order.
const OPTION_NAMES: [&str; OPTION_COUNT] = [
    "debug",
    "memlimit",
    "timelimit",
    "maxfilesize",
    "infile",
    "outfile",
    "errfile",
];

/// A path whose length has been checked against [`MAX_PATH_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedPath(PathBuf);

impl BoundedPath {
    pub fn new(field: &'static str, value: impl Into<PathBuf>) -> Result<Self, LaunchError> {
        let path: PathBuf = value.into();
        let len = path.as_os_str().as_bytes().len();
        if len > MAX_PATH_LEN {
            return Err(LaunchError::PathTooLong {
                field,
                len,
                max: MAX_PATH_LEN,
            });
        }
        if len == 0 {
            return Err(LaunchError::Config(format!("{field} path is empty")));
        }
        Ok(BoundedPath(path))
    }

    pub fn as_path(&self) -> &std::path::Path {
        &self.0
    }
}

/// Options as found on the command line, before required fields are checked.
#[derive(Debug, Default, Clone)]
pub struct RawOptions {
    pub debug: Option<bool>,
    pub memory_limit_mb: Option<u64>,
    pub time_limit_sec: Option<u64>,
    pub max_file_size_mb: Option<u64>,
    pub stdin_path: Option<OsString>,
    pub stdout_path: Option<OsString>,
    pub stderr_path: Option<OsString>,
}

/// Everything needed to launch and supervise one target program.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub debug: bool,
    pub memory_limit_mb: u64,
    pub time_limit_sec: u64,
    pub max_file_size_mb: u64,
    pub stdin_path: BoundedPath,
    pub stdout_path: BoundedPath,
    pub stderr_path: BoundedPath,
    /// Program followed by its arguments.
    pub target_command: Vec<OsString>,
}

impl ExecutionRequest {
    /// Parse the full process argument vector, including the launcher's own name.
    pub fn from_args<I>(args: I) -> Result<Self, LaunchError>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::<OsString>::into).skip(1);
        let options: Vec<OsString> = args.by_ref().take(OPTION_COUNT).collect();
        let target_command: Vec<OsString> = args.collect();
        Self::build(parse_options(&options), target_command)
    }

    /// Check the required fields and assemble the request.
    pub fn build(raw: RawOptions, target_command: Vec<OsString>) -> Result<Self, LaunchError> {
        if target_command.is_empty() {
            return Err(LaunchError::Config(format!(
                "no target command after the {OPTION_COUNT} options"
            )));
        }
        Ok(ExecutionRequest {
            debug: raw.debug.unwrap_or(false),
            memory_limit_mb: required("memlimit", raw.memory_limit_mb)?,
            time_limit_sec: required("timelimit", raw.time_limit_sec)?,
            max_file_size_mb: required("maxfilesize", raw.max_file_size_mb)?,
            stdin_path: BoundedPath::new("infile", required("infile", raw.stdin_path)?)?,
            stdout_path: BoundedPath::new("outfile", required("outfile", raw.stdout_path)?)?,
            stderr_path: BoundedPath::new("errfile", required("errfile", raw.stderr_path)?)?,
            target_command,
        })
    }

    /// The program part of the target command.  `None` only for a request
    /// assembled by hand with an empty command.
    pub fn program(&self) -> Option<&OsStr> {
        self.target_command.first().map(OsString::as_os_str)
    }
}

fn required<T>(name: &str, value: Option<T>) -> Result<T, LaunchError> {
    value.ok_or_else(|| LaunchError::Config(format!("missing required option {name}=")))
}

/// Read the option tokens.  Nothing here fails; unknown tokens are dropped.
pub fn parse_options(tokens: &[OsString]) -> RawOptions {
    let mut raw = RawOptions::default();
    for token in tokens {
        let bytes = token.as_bytes();
        let (name, value) = match bytes.iter().position(|b| *b == b'=') {
            Some(idx) => (&bytes[..idx], &bytes[idx + 1..]),
            None => {
                log::debug!("ignoring option token without a value: {:?}", token);
                continue;
            }
        };
        let Some(idx) = OPTION_NAMES
            .iter()
            .position(|opt| name.starts_with(opt.as_bytes()))
        else {
            log::debug!("ignoring unrecognized option token: {:?}", token);
            continue;
        };
        match idx {
            // Only the first character counts; anything but '0' enables.
            0 => raw.debug = Some(value.first() != Some(&b'0')),
            1 => raw.memory_limit_mb = Some(atou(value)),
            2 => raw.time_limit_sec = Some(atou(value)),
            3 => raw.max_file_size_mb = Some(atou(value)),
            4 => raw.stdin_path = Some(OsString::from(OsStr::from_bytes(value))),
            5 => raw.stdout_path = Some(OsString::from(OsStr::from_bytes(value))),
            _ => raw.stderr_path = Some(OsString::from(OsStr::from_bytes(value))),
        }
    }
    raw
}

/// Lenient integer conversion: optional leading whitespace and sign, then
/// as many digits as are present.  Anything unparsable is zero.
fn atoi(value: &[u8]) -> i64 {
    let mut iter = value
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .peekable();
    let negative = match iter.peek() {
        Some(&&b'-') => {
            iter.next();
            true
        }
        Some(&&b'+') => {
            iter.next();
            false
        }
        _ => false,
    };
    let mut n: i64 = 0;
    for b in iter.take_while(|b| b.is_ascii_digit()) {
        n = n.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative { -n } else { n }
}

/// Limits are never negative; a negative value clamps to zero.
fn atou(value: &[u8]) -> u64 {
    u64::try_from(atoi(value)).unwrap_or(0)
}
