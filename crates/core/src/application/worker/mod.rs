// Docking worker - runs a blocking docking job off the caller's task

mod panic_guard;

pub use panic_guard::{execute_guarded, PanicGuardResult};

use crate::application::docking::{DockingOutcome, DockingRequest, DockingService};
use crate::error::{AppError, Result};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Terminal message sent after a successful run
pub const DONE_MESSAGE: &str = "Done";

/// Events reported by a running job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Intermediate output (tool stdout, exit code line)
    Progress(String),
    /// Sent exactly once, last: `DONE_MESSAGE` or the error text
    Finished(String),
}

/// Handle to a spawned job
pub struct WorkerHandle {
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    join: JoinHandle<Option<DockingOutcome>>,
}

impl WorkerHandle {
    /// Next event; `None` once the job is over and all events were drained
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    /// Drain every event through `on_event`, then return the outcome
    ///
    /// The outcome is `None` when the job failed; the failure text was
    /// already delivered as `WorkerEvent::Finished`.
    pub async fn run_to_end<F>(mut self, mut on_event: F) -> Result<Option<DockingOutcome>>
    where
        F: FnMut(WorkerEvent),
    {
        while let Some(event) = self.events.recv().await {
            on_event(event);
        }

        self.join
            .await
            .map_err(|e| AppError::Internal(format!("Docking worker join failed: {}", e)))
    }
}

/// Spawns docking jobs on tokio's blocking pool
#[derive(Clone)]
pub struct DockingWorker {
    service: Arc<DockingService>,
}

impl DockingWorker {
    pub fn new(service: Arc<DockingService>) -> Self {
        Self { service }
    }

    /// Start a job; must be called from within a tokio runtime
    pub fn spawn(&self, request: DockingRequest) -> WorkerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Arc::clone(&self.service);

        let join = tokio::task::spawn_blocking(move || {
            info!(job_id = %request.id, "Docking job started");

            let result = execute_guarded(AssertUnwindSafe(|| service.dock(&request)));

            // Send errors only mean nobody is listening anymore
            match result {
                PanicGuardResult::Success(Ok(outcome)) => {
                    let _ = tx.send(WorkerEvent::Progress(outcome.output.stdout_lossy()));
                    let rc = outcome
                        .output
                        .exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "none".to_string());
                    let _ = tx.send(WorkerEvent::Progress(format!("rc = {}", rc)));
                    let _ = tx.send(WorkerEvent::Finished(DONE_MESSAGE.to_string()));

                    info!(job_id = %request.id, exit_code = ?outcome.output.exit_code, "Docking job finished");
                    Some(outcome)
                }
                PanicGuardResult::Success(Err(e)) => {
                    warn!(job_id = %request.id, error = %e, "Docking job failed");
                    let _ = tx.send(WorkerEvent::Finished(e.to_string()));
                    None
                }
                PanicGuardResult::Panicked(msg) => {
                    let _ = tx.send(WorkerEvent::Finished(format!(
                        "Docking job panicked: {}",
                        msg
                    )));
                    None
                }
            }
        });

        WorkerHandle { events: rx, join }
    }
}
