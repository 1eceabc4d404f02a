// Subprocess runner implementation
// reason: blocking std::process - one child at a time, waited to completion
use std::collections::HashMap;
use std::ffi::OsString;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use tracing::{debug, info};

use dockwrap_core::port::{
    ExecutionError, ProcessOutput, ProcessRequest, ProcessRunner, TimeProvider,
};

/// Subprocess runner
/// Spawns the child with piped stdout/stderr and blocks until it exits
pub struct SubprocessRunner {
    time_provider: Arc<dyn TimeProvider>,
    /// None inherits the full parent environment
    env_allowlist: Option<Vec<String>>,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - If set, only these variables reach the child
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new(
    ///     Arc::new(SystemTimeProvider),
    ///     Some(vec!["PATH".to_string(), "HOME".to_string()]),
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Option<Vec<String>>) -> Self {
        Self {
            time_provider,
            env_allowlist,
        }
    }

    /// Runner that passes the parent environment through untouched
    pub fn inheriting(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::new(time_provider, None)
    }

    /// Filter environment variables to allowlist only
    ///
    /// Works on `OsString` so non-UTF-8 variables in the parent never fail.
    fn filter_env(&self, env: &HashMap<OsString, OsString>) -> HashMap<OsString, OsString> {
        match &self.env_allowlist {
            Some(allowlist) => env
                .iter()
                .filter(|(k, _)| allowlist.iter().any(|allowed| k.as_os_str() == allowed.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => env.clone(),
        }
    }

    fn build_command(&self, request: &ProcessRequest) -> Command {
        let command_line = &request.command_line;

        let mut command = Command::new(command_line.program());
        command
            .args(command_line.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }

        if self.env_allowlist.is_some() {
            let parent_env: HashMap<OsString, OsString> = std::env::vars_os().collect();
            command.env_clear().envs(self.filter_env(&parent_env));
        }

        command
    }

    /// Spawn child process and wait for output
    fn spawn_and_wait(&self, request: &ProcessRequest) -> Result<Output, ExecutionError> {
        let program = request.command_line.program().to_string();

        let child = self
            .build_command(request)
            .spawn()
            .map_err(|source| ExecutionError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        debug!(pid = child.id(), program = %program, "Child process spawned");

        child
            .wait_with_output()
            .map_err(|source| ExecutionError::Io { program, source })
    }

    /// Build process output from the finished child
    fn build_output(&self, output: Output, duration_ms: i64) -> ProcessOutput {
        ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
            duration_ms,
        }
    }
}

impl ProcessRunner for SubprocessRunner {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        info!(
            command = %request.command_line,
            working_dir = ?request.working_dir,
            "Starting subprocess"
        );

        let output = self.spawn_and_wait(request)?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_output(output, duration_ms);

        info!(
            program = %request.command_line.program(),
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            "Subprocess completed"
        );

        Ok(result)
    }
}
