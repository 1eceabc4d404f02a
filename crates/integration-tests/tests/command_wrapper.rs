//! Command wrapper integration tests
//!
//! Keyword/positional marshaling run through a real child process.

use std::path::Path;
use std::sync::Arc;

use dockwrap_core::application::{create_tool, Invocation, ToolCommand};
use dockwrap_core::domain::{ArgValue, DomainError, KwArgs};
use dockwrap_core::port::time_provider::SystemTimeProvider;
use dockwrap_core::port::{ExecutionError, ProcessRunner};
use dockwrap_core::AppError;
use dockwrap_infra_system::SubprocessRunner;

fn runner() -> Arc<dyn ProcessRunner> {
    Arc::new(SubprocessRunner::inheriting(Arc::new(SystemTimeProvider)))
}

/// Script printing every argv token on its own line, run through the `sh` driver
fn argv_echo(dir: &Path) -> ToolCommand {
    let script = dir.join("argv_echo.sh");
    std::fs::write(&script, "for a in \"$@\"; do printf '%s\\n' \"$a\"; done\n").unwrap();

    ToolCommand::new(
        create_tool("ARGV_ECHO", script.to_string_lossy(), Some("sh")),
        runner(),
    )
}

fn lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_tokens_reach_child_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let output = argv_echo(dir.path())
        .with_kwarg("exhaustiveness", 8)
        .execute(
            &Invocation::new()
                .kwarg("out", "my result.pdbqt")
                .kwarg("n", 9)
                .flag("v")
                .arg("input.pdbqt"),
        )
        .unwrap();

    assert!(output.success());
    assert_eq!(
        lines(&output.stdout),
        vec![
            "--exhaustiveness=8",
            "--out=my result.pdbqt",
            "-n",
            "9",
            "-v",
            "input.pdbqt",
        ]
    );
}

#[test]
fn test_call_time_kwargs_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let defaults: KwArgs = [("a", 1)].into_iter().collect();
    let cmd = argv_echo(dir.path()).with_kwargs(&defaults).with_arg("x");

    let output = cmd
        .execute(&Invocation::new().kwarg("a", 2).kwarg("b", 3).arg("y"))
        .unwrap();

    assert_eq!(lines(&output.stdout), vec!["-a", "2", "-b", "3", "x", "y"]);
}

#[test]
fn test_vina_style_token_sequence() {
    let cmd = ToolCommand::new(create_tool("TOOL", "tool", None), runner())
        .with_kwarg("exhaustiveness", 8);

    let line = cmd
        .command_line(
            &Invocation::new()
                .kwarg("out", "result.pdbqt")
                .arg("input.pdbqt"),
        )
        .unwrap();

    assert_eq!(
        line.into_tokens(),
        vec!["tool", "--exhaustiveness=8", "--out=result.pdbqt", "input.pdbqt"]
    );
}

#[test]
fn test_exit_code_and_stderr_returned_as_is() {
    let sh = ToolCommand::new(create_tool("SH", "sh", None), runner());

    let output = sh
        .execute(&Invocation::new().kwarg("c", "printf err >&2; exit 5"))
        .unwrap();

    assert_eq!(output.exit_code, Some(5));
    assert_eq!(output.stderr, b"err");
    assert!(output.stdout.is_empty());
}

#[test]
fn test_raw_bytes_are_preserved() {
    let sh = ToolCommand::new(create_tool("SH", "sh", None), runner());

    let output = sh
        .execute(&Invocation::new().kwarg("c", r"printf '\377\000x'"))
        .unwrap();

    assert_eq!(output.stdout, vec![0xff, 0x00, b'x']);
}

#[test]
fn test_false_value_rejected_before_spawn() {
    let cmd = ToolCommand::new(create_tool("MISSING", "dockwrap-no-such-tool", None), runner());

    // would be SpawnFailed if anything were launched
    let err = cmd
        .execute(&Invocation::new().kwarg("no_refine", false))
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Domain(DomainError::FalseFlag { ref key }) if key == "no_refine"
    ));
}

#[test]
fn test_launch_failure_propagates() {
    let cmd = ToolCommand::new(create_tool("MISSING", "dockwrap-no-such-tool", None), runner());

    let err = cmd.execute(&Invocation::new()).unwrap_err();

    assert!(matches!(
        err,
        AppError::Execution(ExecutionError::SpawnFailed { .. })
    ));
}

#[test]
fn test_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ligand.pdbqt"), "ATOM").unwrap();

    let ls = ToolCommand::new(create_tool("LS", "ls", None), runner());
    let output = ls
        .execute(&Invocation::new().in_dir(dir.path()))
        .unwrap();

    assert_eq!(lines(&output.stdout), vec!["ligand.pdbqt"]);
}

#[test]
fn test_json_payload_as_kwargs() {
    let dir = tempfile::tempdir().unwrap();
    let payload = serde_json::json!({ "ligand": ["a.pdbqt", "b.pdbqt"], "seed": 42 });

    let mut invocation = Invocation::new();
    if let serde_json::Value::Object(map) = payload {
        for (key, value) in map {
            invocation = invocation.kwarg(key, ArgValue::try_from(value).unwrap());
        }
    }

    let output = argv_echo(dir.path()).execute(&invocation).unwrap();

    assert_eq!(
        lines(&output.stdout),
        vec!["--ligand=a.pdbqt", "--ligand=b.pdbqt", "--seed=42"]
    );
}
