// Tool Command - bind defaults, merge call-time arguments, run
use crate::domain::{prepare_args, ArgValue, CommandLine, KwArgs, PosArgs};
use crate::error::Result;
use crate::port::{ProcessOutput, ProcessRequest, ProcessRunner};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::tool::ToolSpec;

/// Call-time arguments for a single tool run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub args: PosArgs,
    pub kwargs: KwArgs,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.kwargs.insert(key, value);
        self
    }

    /// Shorthand for `kwarg(key, true)`
    pub fn flag(self, key: impl Into<String>) -> Self {
        self.kwarg(key, true)
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// An external tool with default arguments bound at construction time
///
/// Positional defaults come before call-time positionals; call-time keyword
/// values override same-named defaults.
///
/// # Example
/// ```text
/// let vina = ToolCommand::new(create_tool("VINA", "vina", None), runner)
///     .with_kwarg("exhaustiveness", 8);
/// let output = vina.execute(&Invocation::new().kwarg("out", "result.pdbqt"))?;
/// ```
#[derive(Clone)]
pub struct ToolCommand {
    spec: ToolSpec,
    default_args: PosArgs,
    default_kwargs: KwArgs,
    runner: Arc<dyn ProcessRunner>,
}

impl ToolCommand {
    pub fn new(spec: ToolSpec, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            spec,
            default_args: PosArgs::new(),
            default_kwargs: KwArgs::new(),
            runner,
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.default_args.push(arg.into());
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.default_kwargs.insert(key, value);
        self
    }

    pub fn with_kwargs(mut self, kwargs: &KwArgs) -> Self {
        self.default_kwargs = self.default_kwargs.merged(kwargs);
        self
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    pub fn default_kwargs(&self) -> &KwArgs {
        &self.default_kwargs
    }

    /// Merge defaults with call-time arguments, positional and keyword groups separately
    pub fn combine(&self, invocation: &Invocation) -> (PosArgs, KwArgs) {
        let mut args = self.default_args.clone();
        args.extend(invocation.args.iter().cloned());

        let kwargs = self.default_kwargs.merged(&invocation.kwargs);

        debug!(
            tool = %self.spec.name,
            args = ?args,
            kwargs = ?kwargs,
            "Combined default and call-time arguments"
        );

        (args, kwargs)
    }

    /// Full token sequence for this invocation, driver and program first
    ///
    /// # Errors
    /// - DomainError::FalseFlag if a keyword value is `false`
    pub fn command_line(&self, invocation: &Invocation) -> Result<CommandLine> {
        let (args, kwargs) = self.combine(invocation);
        let options = prepare_args(&args, &kwargs)?;

        let command_line = match &self.spec.driver {
            Some(driver) => {
                let mut tokens = Vec::with_capacity(options.len() + 1);
                tokens.push(self.spec.program.clone());
                tokens.extend(options);
                CommandLine::new(driver.clone(), tokens)?
            }
            None => CommandLine::new(self.spec.program.clone(), options)?,
        };

        Ok(command_line)
    }

    /// Run the tool and wait for it to exit
    ///
    /// The command line is validated before anything is spawned. The exit
    /// code is returned as-is; launch failures propagate unchanged.
    pub fn execute(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let command_line = self.command_line(invocation)?;

        info!(
            tool = %self.spec.name,
            command = %command_line,
            working_dir = ?invocation.working_dir,
            "Running tool"
        );

        let request = ProcessRequest {
            command_line,
            working_dir: invocation.working_dir.clone(),
        };

        let output = self.runner.run(&request)?;

        info!(
            tool = %self.spec.name,
            exit_code = ?output.exit_code,
            duration_ms = %output.duration_ms,
            "Tool finished"
        );

        Ok(output)
    }
}

impl fmt::Debug for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCommand")
            .field("spec", &self.spec)
            .field("default_args", &self.default_args)
            .field("default_kwargs", &self.default_kwargs)
            .finish_non_exhaustive()
    }
}
