// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// `false` cannot mean "leave the flag out", so it is refused outright
    #[error("False value detected for option '{key}'")]
    FalseFlag { key: String },

    #[error("Option name must not be empty")]
    EmptyKey,

    #[error("Command line must name a program")]
    EmptyProgram,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
