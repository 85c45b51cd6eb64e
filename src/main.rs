// SPDX-License-Identifier: MIT

//! Command line entry point.
//!
//! Usage: `sandlaunch debug=<0|1> memlimit=<MB> timelimit=<secs>
//! maxfilesize=<MB> infile=<path> outfile=<path> errfile=<path> <program> [args...]`
//!
//! All seven options must come first, in any order.

use sandlaunch::runtime::{exit_code, ExecutionRequest, LauncherConfig};

fn main() {
    let result = match ExecutionRequest::from_args(std::env::args_os()) {
        Ok(request) => {
            init_logging(request.debug);
            sandlaunch::run(&request, &LauncherConfig::default())
        }
        Err(e) => {
            init_logging(false);
            Err(e)
        }
    };
    std::process::exit(exit_code(result));
}

/// Log to the launcher's own stderr.  The level comes from the debug
/// option only; the environment is not consulted.
fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .init();
}
