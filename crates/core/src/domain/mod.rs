// Domain Layer - Pure argument marshaling

pub mod arg;
pub mod command_line;
pub mod error;

// Re-exports
pub use arg::{ArgValue, KwArgs, PosArgs};
pub use command_line::{flag_for, prepare_args, CommandLine, FLAG_MARKER};
pub use error::DomainError;
