/// Run the `mango` binary on small scripts and check its stdout.
///
/// Each test writes its script (and optionally an rc file) into a fresh
/// temporary directory and runs the binary there with a short tick interval.
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Path to the `mango` binary built by this Cargo workspace.
fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mango"))
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(binary())
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run mango")
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_owned)
        .collect()
}

const COUNTER: &str = "\
function start {
    x = 0
}

function update {
    x += 1
    if x == 2
        print(\"halfway\")
    endif
}
";

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn runs_start_then_ticks_update() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("code.mango"), COUNTER).unwrap();

    let out = run_in(dir.path(), &["-f", "-t3", "-i1"]);
    assert!(out.status.success(), "{out:?}");
    assert_eq!(
        stdout_lines(&out),
        vec![
            "[Mango] Script loaded: 2 functions.",
            "[Mango] X = 1",
            "[Mango] halfway",
            "[Mango] X = 2",
            "[Mango] X = 3",
        ]
    );
}

#[test]
fn quiet_mode_and_explicit_script() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("counter.mango"), COUNTER).unwrap();

    let out = run_in(dir.path(), &["-q", "-f", "-t2", "-i1", "counter.mango"]);
    assert!(out.status.success(), "{out:?}");
    assert_eq!(
        stdout_lines(&out),
        vec!["[Mango] Script loaded: 2 functions.", "[Mango] halfway"]
    );
}

#[test]
fn rc_file_seeds_variables_and_settings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("game.mango"), "function update {\nx += step\n}\n").unwrap();
    std::fs::write(dir.path().join("game.rc"), "; demo\nticks = 2\ntick_ms = 1\nset x=10\nset step=5\n").unwrap();

    let out = run_in(dir.path(), &["-f", "game.rc", "game.mango"]);
    assert!(out.status.success(), "{out:?}");
    assert_eq!(
        stdout_lines(&out),
        vec!["[Mango] Script loaded: 1 functions.", "[Mango] X = 15", "[Mango] X = 20"]
    );
}

#[test]
fn local_mangorc_is_found() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("code.mango"), COUNTER).unwrap();
    std::fs::write(dir.path().join(".mangorc"), "ticks = 1\ntick_ms = 1\n").unwrap();

    let out = run_in(dir.path(), &[]);
    assert!(out.status.success(), "{out:?}");
    assert_eq!(
        stdout_lines(&out),
        vec!["[Mango] Script loaded: 2 functions.", "[Mango] X = 1"]
    );
}

#[test]
fn step_budget_stops_runaway_update() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("code.mango"), "function update {\nwhile true x = 1\n}\n").unwrap();

    let out = run_in(dir.path(), &["-f", "-t1", "-i1", "-b100"]);
    assert_eq!(out.status.code(), Some(1));
    let lines = stdout_lines(&out);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("[Mango] Stopped: step budget of 100 statements exhausted")
    );
}

#[test]
fn load_error_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("code.mango"), "function start {\nx = 1\n").unwrap();

    let out = run_in(dir.path(), &["-f", "-t1"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout_lines(&out).is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("mismatched braces"), "{stderr}");
}

#[test]
fn missing_script_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_in(dir.path(), &["-f", "nothing.mango"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn bad_flag_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_in(dir.path(), &["-z"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage: mango"));
}
