// dockwrap Infrastructure - System Adapters
// Implements: ProcessRunner (std::process), tool executable lookup

pub mod subprocess_runner;
pub mod tool_locator;

pub use subprocess_runner::SubprocessRunner;
pub use tool_locator::ToolLocator;
