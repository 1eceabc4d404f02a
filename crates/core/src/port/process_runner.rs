// Process Runner Port
// Abstraction for running an external program to completion

use crate::domain::CommandLine;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// What to run and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub command_line: CommandLine,
    /// Run in this directory instead of the caller's current directory
    pub working_dir: Option<PathBuf>,
}

impl ProcessRequest {
    pub fn new(command_line: CommandLine) -> Self {
        Self {
            command_line,
            working_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Completed process: exit code plus raw captured output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    /// None if the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration_ms: i64,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to launch '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while waiting for '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Process Runner trait
///
/// Implementations block until the child exits; there is no timeout and no
/// cancellation. A non-zero exit code is a successful run, not an error.
///
/// Implementations:
/// - SubprocessRunner (infra-system): spawns a real child process
/// - mocks::RecordingRunner: records requests, returns canned output
pub trait ProcessRunner: Send + Sync {
    /// Run the command to completion, capturing stdout and stderr
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the process cannot be started
    /// - ExecutionError::Io if waiting for the process fails
    fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock runner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit with the given code and stdout
        Exit(i32, String),
        /// Fail to launch with `io::ErrorKind::NotFound`
        NotFound,
        /// Panic with message (for worker isolation testing)
        Panic(String),
    }

    /// Records every request and answers with a fixed behavior
    #[derive(Clone)]
    pub struct RecordingRunner {
        behavior: Arc<Mutex<MockBehavior>>,
        requests: Arc<Mutex<Vec<ProcessRequest>>>,
    }

    impl RecordingRunner {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Exit(0, "mock output".to_string()))
        }

        pub fn new_exit(code: i32, stdout: impl Into<String>) -> Self {
            Self::new(MockBehavior::Exit(code, stdout.into()))
        }

        pub fn new_not_found() -> Self {
            Self::new(MockBehavior::NotFound)
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        pub fn requests(&self) -> Vec<ProcessRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Token vector of the most recent request
        pub fn last_tokens(&self) -> Option<Vec<String>> {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|r| r.command_line.tokens().to_vec())
        }
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput, ExecutionError> {
            self.requests.lock().unwrap().push(request.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Exit(code, stdout) => Ok(ProcessOutput {
                    exit_code: Some(code),
                    stdout: stdout.into_bytes(),
                    stderr: Vec::new(),
                    duration_ms: 1,
                }),
                MockBehavior::NotFound => Err(ExecutionError::SpawnFailed {
                    program: request.command_line.program().to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg);
                }
            }
        }
    }
}
