// SPDX-License-Identifier: MIT

//! Launch the child process.

use std::{
    ffi::{CString, OsStr},
    os::unix::ffi::OsStrExt as _,
    path::PathBuf,
    ptr,
};

use nix::libc::{self, c_char};

use crate::runtime::{
    config::Credentials,
    error::LaunchError,
    request::ExecutionRequest,
    spawn::{EXEC_FAILURE, SETUP_FAILURE},
    spawn_linux::{
        child::{exit_with_error, ChildError},
        fd::{close_open_fds, Redirection, FIRST_INHERITED_FD},
        identity::IdentityDrop,
        limits::ResourceLimits,
    },
};

/// Program path and argument vector, converted for `execv` before the fork.
struct ExecImage {
    path: CString,
    // Owns the strings that `argv_ptrs` points into.
    _argv: Vec<CString>,
    argv_ptrs: Vec<*const c_char>,
}

impl ExecImage {
    fn new(program: PathBuf, args: &[std::ffi::OsString]) -> Result<Self, LaunchError> {
        let path = CString::new(program.as_os_str().as_bytes())?;
        let mut argv = Vec::with_capacity(args.len());
        for arg in args {
            argv.push(CString::new(arg.as_os_str().as_bytes())?);
        }
        let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|a| a.as_ptr()).collect();
        argv_ptrs.push(ptr::null());
        Ok(ExecImage {
            path,
            _argv: argv,
            argv_ptrs,
        })
    }

    /// Replace the process image.  Only returns on failure.
    fn exec(&self) -> ChildError {
        unsafe { libc::execv(self.path.as_ptr(), self.argv_ptrs.as_ptr()) };
        ChildError::last("exec target")
    }
}

/// Search `PATH` for the program the way a path-searching exec would.
/// When nothing is found the name is kept as is, and the exec fails in the
/// child.
pub fn resolve_program(program: &OsStr) -> PathBuf {
    match which::which(program) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("could not resolve {:?}: {e}", program);
            PathBuf::from(program)
        }
    }
}

/// Fork the child, which sets up its sandbox and becomes the target program.
/// Returns the child's pid in the parent.
pub fn launch_child(
    request: &ExecutionRequest,
    creds: Credentials,
) -> Result<nix::unistd::Pid, LaunchError> {
    // Everything that allocates happens before the fork.
    let Some(program) = request.program() else {
        return Err(LaunchError::Config("empty target command".to_string()));
    };
    let program = resolve_program(program);
    log::debug!("launching {:?} as uid {}", program, creds.uid);
    let image = ExecImage::new(program, &request.target_command)?;
    let redirect = Redirection::new(request)?;
    let identity = IdentityDrop::new(creds);
    let limits = ResourceLimits::from_request(request);
    log::debug!("child limits: {limits:?}");

    match unsafe { nix::unistd::fork() } {
        Err(e) => Err(LaunchError::Process(format!("fork failed: {e}"))),
        Ok(nix::unistd::ForkResult::Child) => {
            // Any errors in here must trigger an immediate exit.
            if let Err(e) = setup_child(&redirect, &identity, &limits) {
                exit_with_error(e, SETUP_FAILURE);
            }
            let err = image.exec();
            // To reach here means the exec failed.
            exit_with_error(err, EXEC_FAILURE);
        }
        Ok(nix::unistd::ForkResult::Parent { child }) => {
            log::debug!("forked child {child}");
            Ok(child)
        }
    }
}

/// Redirect, drop identity, then limit.  The files must be opened while the
/// launcher's identity still allows creating them.
fn setup_child(
    redirect: &Redirection,
    identity: &IdentityDrop,
    limits: &ResourceLimits,
) -> Result<(), ChildError> {
    redirect.child_after_fork()?;
    close_open_fds(FIRST_INHERITED_FD)?;
    identity.child_after_fork()?;
    limits.child_after_fork()?;
    Ok(())
}
