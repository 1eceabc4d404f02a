// Application Layer - Use Cases

pub mod command;
pub mod docking;
pub mod tool;
pub mod worker;

// Re-exports
pub use command::{Invocation, ToolCommand};
pub use docking::{DockingOutcome, DockingRequest, DockingService, Ligand, Receptor};
pub use tool::{create_tool, ToolRegistry, ToolSpec};
pub use worker::{DockingWorker, WorkerEvent, WorkerHandle};
