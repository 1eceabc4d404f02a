//! Docking job integration tests
//!
//! DockingService + DockingWorker driving a stand-in `vina` script.

use std::path::Path;
use std::sync::Arc;

use dockwrap_core::application::docking::{DockingMode, DockingScope};
use dockwrap_core::application::worker::DONE_MESSAGE;
use dockwrap_core::application::{
    create_tool, DockingRequest, DockingService, DockingWorker, Ligand, Receptor, ToolCommand,
    WorkerEvent,
};
use dockwrap_core::port::time_provider::SystemTimeProvider;
use dockwrap_infra_system::SubprocessRunner;

/// Echoes its arguments and writes a dummy pose file to `--out`
const FAKE_VINA: &str = r#"for a in "$@"; do
  case "$a" in
    --out=*) echo "MODEL 1" > "${a#--out=}" ;;
  esac
  echo "$a"
done
exit "${FAKE_VINA_EXIT:-0}"
"#;

fn service(dir: &Path, script_body: &str) -> DockingService {
    let script = dir.join("vina.sh");
    std::fs::write(&script, script_body).unwrap();

    let runner = Arc::new(SubprocessRunner::inheriting(Arc::new(SystemTimeProvider)));
    DockingService::new(ToolCommand::new(
        create_tool("VINA", script.to_string_lossy(), Some("sh")),
        runner,
    ))
}

#[test]
fn test_single_ligand_writes_output_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let request = DockingRequest::new(
        Receptor::rigid("1abc", "1abc.pdbqt"),
        vec![Ligand::new("str", "str.pdbqt")],
    )
    .with_box("box.txt")
    .in_dir(dir.path());

    let outcome = service(dir.path(), FAKE_VINA).dock(&request).unwrap();

    assert_eq!(outcome.mode, DockingMode::Rigid);
    assert_eq!(outcome.scope, DockingScope::Single);
    assert!(outcome.output.success());
    assert!(dir.path().join(&outcome.output_file).exists());
    assert_eq!(
        outcome.output.stdout_lossy(),
        "--receptor=1abc.pdbqt\n--ligand=str.pdbqt\n--config=box.txt\n--exhaustiveness=8\n--out=vina_result_1abc.pdbqt\n"
    );
}

#[tokio::test]
async fn test_worker_batch_flexible_docking() {
    let dir = tempfile::tempdir().unwrap();
    let worker = DockingWorker::new(Arc::new(service(dir.path(), FAKE_VINA)));

    let request = DockingRequest::new(
        Receptor::flexible(
            "1abc",
            "rigid.pdbqt",
            "flex.pdbqt",
            vec!["A:ARG:8".to_string()],
        ),
        vec![Ligand::new("a", "a.pdbqt"), Ligand::new("b", "b.pdbqt")],
    )
    .in_dir(dir.path());

    let mut events = Vec::new();
    let outcome = worker
        .spawn(request)
        .run_to_end(|e| events.push(e))
        .await
        .unwrap()
        .expect("docking outcome");

    assert_eq!(outcome.mode, DockingMode::Flexible);
    assert_eq!(outcome.scope, DockingScope::Batch);
    assert!(dir
        .path()
        .join("vina_multidock_result_1abc_flexible.pdbqt")
        .exists());

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], WorkerEvent::Progress(out) if out.contains("--ligand=b.pdbqt")));
    assert_eq!(events[1], WorkerEvent::Progress("rc = 0".to_string()));
    assert_eq!(events[2], WorkerEvent::Finished(DONE_MESSAGE.to_string()));
}

#[tokio::test]
async fn test_worker_reports_non_zero_exit_without_interpreting_it() {
    let dir = tempfile::tempdir().unwrap();
    let worker = DockingWorker::new(Arc::new(service(dir.path(), "echo bad box >&2\nexit 2\n")));

    let request = DockingRequest::new(
        Receptor::rigid("r", "r.pdbqt"),
        vec![Ligand::new("l", "l.pdbqt")],
    );

    let mut events = Vec::new();
    let outcome = worker
        .spawn(request)
        .run_to_end(|e| events.push(e))
        .await
        .unwrap()
        .expect("docking outcome");

    assert_eq!(outcome.output.exit_code, Some(2));
    assert_eq!(outcome.output.stderr_lossy(), "bad box\n");
    assert_eq!(events[1], WorkerEvent::Progress("rc = 2".to_string()));
    assert_eq!(events[2], WorkerEvent::Finished(DONE_MESSAGE.to_string()));
}

#[tokio::test]
async fn test_worker_reports_launch_failure() {
    let runner = Arc::new(SubprocessRunner::inheriting(Arc::new(SystemTimeProvider)));
    let vina = ToolCommand::new(create_tool("VINA", "dockwrap-no-such-vina", None), runner);
    let worker = DockingWorker::new(Arc::new(DockingService::new(vina)));

    let request = DockingRequest::new(
        Receptor::rigid("r", "r.pdbqt"),
        vec![Ligand::new("l", "l.pdbqt")],
    );

    let mut handle = worker.spawn(request);

    match handle.next_event().await {
        Some(WorkerEvent::Finished(message)) => {
            assert!(message.contains("Failed to launch 'dockwrap-no-such-vina'"))
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(handle.next_event().await.is_none());
}
