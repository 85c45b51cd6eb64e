//! End-to-end launches.

use std::time::{Duration, Instant};

use super::util::{self, Scratch};
use crate::runtime::{
    config::{Identity, LauncherConfig},
    error::LaunchError,
    request::ExecutionRequest,
    spawn::{Outcome, EXEC_FAILURE, LAUNCHER_FAILURE, SETUP_FAILURE},
};

const MEMORY_MB: u64 = 256;

#[test]
fn exit_code_passes_through() {
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(5, MEMORY_MB, &["sh", "-c", "exit 7"]));
    assert_eq!(sup.outcome, Outcome::Exited(7));
    assert_eq!(sup.outcome.exit_code(), 7);
    assert!(!sup.timed_out);
}

#[test]
fn terminating_signal_passes_through() {
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(5, MEMORY_MB, &["sh", "-c", "kill -TERM $$"]));
    assert_eq!(sup.outcome, Outcome::Signaled(15));
    assert_eq!(sup.outcome.exit_code(), 15);
}

/// Input is delivered verbatim; output lands verbatim in the output file.
#[test]
fn streams_are_redirected() {
    let input = "line one\nline two\n";
    let scratch = Scratch::new(input);
    let sup = util::launch(&scratch.request(5, MEMORY_MB, &["cat"]));
    assert_eq!(sup.outcome, Outcome::Exited(0));
    assert_eq!(scratch.stdout(), input);
}

#[test]
fn error_stream_is_redirected() {
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(5, MEMORY_MB, &["sh", "-c", "echo oops >&2"]));
    assert_eq!(sup.outcome, Outcome::Exited(0));
    assert_eq!(scratch.stderr(), "oops\n");
    assert_eq!(scratch.stdout(), "");
}

#[test]
fn target_runs_as_restricted_identity() {
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(5, MEMORY_MB, &["id", "-u"]));
    assert_eq!(sup.outcome, Outcome::Exited(0));
    assert_eq!(scratch.stdout().trim(), util::credentials().uid.to_string());
}

#[test]
fn target_cannot_fork() {
    let scratch = Scratch::new("");
    // Some shells retry a failed fork until the watchdog kills them; either
    // way the shell reports the failure before giving up.
    util::launch(&scratch.request(
        1,
        MEMORY_MB,
        &["sh", "-c", "(echo forked); echo after"],
    ));
    assert!(!scratch.stdout().contains("forked"), "{}", scratch.stdout());
    assert!(
        scratch.stderr().to_lowercase().contains("fork"),
        "{}",
        scratch.stderr()
    );
}

#[test]
fn missing_target_reports_exec_failure() {
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(5, MEMORY_MB, &["/nonexistent/sandlaunch-target"]));
    assert_eq!(sup.outcome, Outcome::Exited(EXEC_FAILURE));
    assert!(scratch.stderr().contains("exec target"), "{}", scratch.stderr());
}

#[test]
fn missing_input_reports_setup_failure() {
    let scratch = Scratch::new("");
    std::fs::remove_file(scratch.path("in")).unwrap();
    let sup = util::launch(&scratch.request(5, MEMORY_MB, &["cat"]));
    assert_eq!(sup.outcome, Outcome::Exited(SETUP_FAILURE));
}

/// Without root, switching to another user must abort before the exec.
#[test]
fn failed_identity_drop_aborts() {
    if util::is_root() {
        return;
    }
    let scratch = Scratch::new("");
    let request = scratch.request(5, MEMORY_MB, &["sh", "-c", "echo ran"]);
    let foreign = crate::runtime::config::Credentials {
        uid: util::NOBODY,
        gid: util::NOBODY,
    };
    let sup = crate::runtime::launch_as(&request, foreign, Duration::from_secs(2))
        .expect("launch and supervise");
    assert_eq!(sup.outcome, Outcome::Exited(SETUP_FAILURE));
    assert_eq!(scratch.stdout(), "");
    assert!(
        scratch.stderr().contains("clear supplementary groups"),
        "{}",
        scratch.stderr()
    );
}

#[test]
fn watchdog_kills_idle_target() {
    let start = Instant::now();
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(1, MEMORY_MB, &["sleep", "30"]));
    assert_eq!(sup.outcome, Outcome::Signaled(9));
    assert!(sup.timed_out);
    // One second limit plus two seconds grace, with some slack.
    assert!(start.elapsed() < Duration::from_secs(10), "{:?}", start.elapsed());
}

#[test]
fn cpu_limit_stops_busy_loop() {
    let start = Instant::now();
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(1, MEMORY_MB, &["sh", "-c", "while :; do :; done"]));
    // SIGXCPU at the soft cap, or SIGKILL from the hard cap or the watchdog.
    assert!(
        matches!(sup.outcome, Outcome::Signaled(24) | Outcome::Signaled(9)),
        "{:?}",
        sup.outcome
    );
    assert!(start.elapsed() < Duration::from_secs(10), "{:?}", start.elapsed());
}

#[test]
fn memory_limit_stops_growth() {
    let scratch = Scratch::new("");
    let sup = util::launch(&scratch.request(
        10,
        10,
        &["sh", "-c", "a=xxxxxxxxxxxxxxxx; while :; do a=$a$a; done"],
    ));
    assert_eq!(sup.outcome, Outcome::Signaled(11), "{sup:?}");
    assert!(!sup.timed_out, "{:?}", sup);
}

fn config_in(scratch: &Scratch) -> LauncherConfig {
    LauncherConfig {
        restricted_user: Identity::Id(util::credentials().uid),
        debug_log: scratch.path("helper.debug"),
        ..LauncherConfig::default()
    }
}

#[test]
fn run_returns_the_outward_code_and_logs() {
    let scratch = Scratch::new("");
    let mut request = scratch.request(5, MEMORY_MB, &["sh", "-c", "exit 7"]);
    request.debug = true;

    let code = crate::runtime::run(&request, &config_in(&scratch)).expect("run");
    assert_eq!(code, 7);

    let log = std::fs::read_to_string(scratch.path("helper.debug")).expect("debug log written");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
        vec![
            "submission sh status = 1792",
            "child sh exited normally with status = 7",
            "submission sh verdict = RTE",
        ]
    );
}

#[test]
fn run_without_debug_leaves_no_log() {
    let scratch = Scratch::new("");
    let request = scratch.request(5, MEMORY_MB, &["sh", "-c", "kill -SEGV $$"]);
    let code = crate::runtime::exit_code(crate::runtime::run(&request, &config_in(&scratch)));
    assert_eq!(code, 11);
    assert!(!scratch.path("helper.debug").exists());
}

#[test]
fn unknown_restricted_user_is_a_launcher_failure() {
    let scratch = Scratch::new("");
    let request = scratch.request(5, MEMORY_MB, &["sh", "-c", "echo ran"]);
    let config = LauncherConfig {
        restricted_user: Identity::Name("no-such-user-sandlaunch".to_string()),
        ..config_in(&scratch)
    };
    let result = crate::runtime::run(&request, &config);
    assert!(matches!(result, Err(LaunchError::Config(_))), "{result:?}");
    assert_eq!(crate::runtime::exit_code(result), LAUNCHER_FAILURE);
    assert_eq!(scratch.stdout(), "");
}

#[test]
fn missing_options_are_a_launcher_failure() {
    let result = ExecutionRequest::from_args(["sandlaunch", "debug=0", "memlimit=5"])
        .and_then(|request| crate::runtime::run(&request, &LauncherConfig::default()));
    assert_eq!(crate::runtime::exit_code(result), LAUNCHER_FAILURE);
}

#[test]
fn empty_hand_built_command_is_rejected() {
    let scratch = Scratch::new("");
    let request = scratch.request(5, MEMORY_MB, &[]);
    let result = crate::runtime::launch_as(&request, util::credentials(), Duration::from_secs(2));
    assert!(matches!(result, Err(LaunchError::Config(_))), "{result:?}");
}
