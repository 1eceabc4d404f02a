// Port Layer - Interfaces for external dependencies

pub mod process_runner;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use process_runner::{ExecutionError, ProcessOutput, ProcessRequest, ProcessRunner};
pub use time_provider::TimeProvider;
