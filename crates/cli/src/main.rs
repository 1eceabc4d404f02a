//! dockwrap CLI - run AutoDock / Vina command-line tools
//! Composition root: settings, logging, adapters, commands

mod logging;
mod settings;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;

use dockwrap_core::application::docking::{DockingRequest, DockingService, Ligand, Receptor};
use dockwrap_core::application::worker::{DockingWorker, WorkerEvent, DONE_MESSAGE};
use dockwrap_core::application::{create_tool, Invocation, ToolCommand, ToolRegistry};
use dockwrap_core::domain::ArgValue;
use dockwrap_core::port::time_provider::SystemTimeProvider;
use dockwrap_core::port::{ProcessOutput, ProcessRunner};
use dockwrap_infra_system::{SubprocessRunner, ToolLocator};

use settings::Settings;

#[derive(Parser)]
#[command(name = "dockwrap")]
#[command(about = "Run AutoDock / Vina command-line tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "DOCKWRAP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program, translating KEY=VALUE options into flags
    Run {
        /// Program to run
        program: String,

        /// Keyword option; one-letter keys become `-k VALUE`, longer keys `--key=VALUE`
        #[arg(short = 'k', long = "kwarg", value_name = "KEY=VALUE", value_parser = parse_kwarg)]
        kwargs: Vec<(String, ArgValue)>,

        /// Bare flag (emitted after the keyword options)
        #[arg(short = 'f', long = "flag", value_name = "FLAG")]
        flags: Vec<String>,

        /// Run in this directory
        #[arg(short = 'C', long = "dir")]
        dir: Option<PathBuf>,

        /// Print the command line instead of running it
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Positional arguments, appended after all options
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// List the known AutoDock / Vina tools and where they resolve
    Tools,

    /// Dock one or more ligands against a receptor with Vina
    Dock {
        /// Receptor PDBQT (rigid docking)
        #[arg(long)]
        receptor: Option<PathBuf>,

        /// Rigid part of a flexible receptor
        #[arg(long)]
        rigid: Option<PathBuf>,

        /// Flexible part of a flexible receptor
        #[arg(long)]
        flex: Option<PathBuf>,

        /// Flexible residue (enables flexible docking)
        #[arg(long = "flexible-residue")]
        flexible_residues: Vec<String>,

        /// Ligand PDBQT (repeatable for batch docking)
        #[arg(long = "ligand", required = true)]
        ligands: Vec<PathBuf>,

        /// Vina config file with the search box
        #[arg(long = "box")]
        box_path: Option<PathBuf>,

        #[arg(long)]
        exhaustiveness: Option<u32>,

        /// Receptor name used in the output file name
        #[arg(long)]
        name: Option<String>,

        /// Run in this directory
        #[arg(short = 'C', long = "dir")]
        dir: Option<PathBuf>,
    },
}

fn parse_kwarg(s: &str) -> std::result::Result<(String, ArgValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{}'", s));
    }
    let value: ArgValue = value.parse().map_err(|e| format!("{}", e))?;
    Ok((key.to_string(), value))
}

#[derive(Tabled)]
struct ToolRow {
    key: String,
    name: String,
    command: String,
    resolved: String,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "receptor".to_string())
}

fn exit_code(output: &ProcessOutput) -> ExitCode {
    match output.exit_code {
        Some(code) => u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from),
        None => ExitCode::FAILURE,
    }
}

fn registry(settings: &Settings) -> ToolRegistry {
    let mut autodock = ToolRegistry::autodock(settings.autodock_driver.as_deref());
    if let Some(dir) = &settings.autodock_tools_dir {
        autodock = autodock.resolve_in(dir);
    }

    let mut vina = ToolRegistry::vina();
    if let Some(dir) = &settings.vina_dir {
        vina = vina.resolve_in(dir);
    }

    autodock.extend(vina);
    autodock
}

#[allow(clippy::too_many_arguments)]
fn run_program(
    runner: Arc<dyn ProcessRunner>,
    program: String,
    kwargs: Vec<(String, ArgValue)>,
    flags: Vec<String>,
    dir: Option<PathBuf>,
    dry_run: bool,
    json_output: bool,
    args: Vec<String>,
) -> Result<ExitCode> {
    let command = ToolCommand::new(create_tool(program.to_uppercase(), &program, None), runner);

    let mut invocation = Invocation::new().args(args);
    for (key, value) in kwargs {
        invocation = invocation.kwarg(key, value);
    }
    for flag in flags {
        invocation = invocation.flag(flag);
    }
    if let Some(dir) = dir {
        invocation = invocation.in_dir(dir);
    }

    let command_line = command.command_line(&invocation)?;

    if dry_run {
        if json_output {
            println!("{}", json!({ "command": command_line }));
        } else {
            println!("{}", command_line);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let output = command
        .execute(&invocation)
        .with_context(|| format!("Failed to run '{}'", program))?;

    if json_output {
        let result = json!({
            "command": command_line,
            "exit_code": output.exit_code,
            "stdout": output.stdout_lossy(),
            "stderr": output.stderr_lossy(),
            "duration_ms": output.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        std::io::stdout().write_all(&output.stdout)?;
        std::io::stderr().write_all(&output.stderr)?;
    }

    Ok(exit_code(&output))
}

fn list_tools(settings: &Settings) {
    let rows: Vec<ToolRow> = registry(settings)
        .iter()
        .map(|(key, spec)| {
            let dir = if key == "vina" {
                settings.vina_dir.as_deref()
            } else {
                settings.autodock_tools_dir.as_deref()
            };
            let resolved = ToolLocator::new(dir)
                .locate(&spec.program)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "not found".to_string());
            let command = match &spec.driver {
                Some(driver) => format!("{} {}", driver, spec.program),
                None => spec.program.clone(),
            };
            ToolRow {
                key: key.to_string(),
                name: spec.name.clone(),
                command,
                resolved,
            }
        })
        .collect();

    println!("{}", "Known tools".cyan().bold());
    println!();
    println!("{}", Table::new(rows));
}

#[allow(clippy::too_many_arguments)]
async fn dock(
    settings: &Settings,
    runner: Arc<dyn ProcessRunner>,
    receptor: Option<PathBuf>,
    rigid: Option<PathBuf>,
    flex: Option<PathBuf>,
    flexible_residues: Vec<String>,
    ligands: Vec<PathBuf>,
    box_path: Option<PathBuf>,
    exhaustiveness: Option<u32>,
    name: Option<String>,
    dir: Option<PathBuf>,
) -> Result<ExitCode> {
    let receptor = if !flexible_residues.is_empty() {
        let name = name
            .or_else(|| rigid.as_deref().map(file_stem))
            .unwrap_or_else(|| "receptor".to_string());
        Receptor {
            name,
            pdbqt: receptor,
            rigid_pdbqt: rigid,
            flex_pdbqt: flex,
            flexible_residues,
        }
    } else {
        match receptor {
            Some(pdbqt) => {
                let name = name.unwrap_or_else(|| file_stem(&pdbqt));
                Receptor::rigid(name, pdbqt)
            }
            None => bail!("No receptor given: pass --receptor, or --rigid/--flex with --flexible-residue"),
        }
    };

    let ligands = ligands
        .into_iter()
        .map(|path| Ligand::new(file_stem(&path), path))
        .collect();

    let mut request = DockingRequest::new(receptor, ligands)
        .with_exhaustiveness(exhaustiveness.unwrap_or(settings.exhaustiveness));
    if let Some(box_path) = box_path.or_else(|| settings.box_path.clone()) {
        request = request.with_box(box_path);
    }
    if let Some(dir) = dir.or_else(|| settings.working_dir.clone()) {
        request = request.in_dir(dir);
    }

    let vina = registry(settings).bind("vina", runner)?;
    let worker = DockingWorker::new(Arc::new(DockingService::new(vina)));

    info!(job_id = %request.id, "Submitting docking job");

    let outcome = worker
        .spawn(request)
        .run_to_end(|event| match event {
            WorkerEvent::Progress(message) => println!("{}", message),
            WorkerEvent::Finished(message) if message == DONE_MESSAGE => {
                println!("{}", format!("✓ {}", message).green().bold())
            }
            WorkerEvent::Finished(message) => eprintln!("{}", format!("✗ {}", message).red().bold()),
        })
        .await?;

    match outcome {
        Some(outcome) => {
            println!("  {} {}", "Output:".bold(), outcome.output_file.display());
            Ok(exit_code(&outcome.output))
        }
        None => Ok(ExitCode::FAILURE),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init_logging()?;

    let settings = Settings::load(cli.config.as_deref())?;

    let runner: Arc<dyn ProcessRunner> = Arc::new(SubprocessRunner::new(
        Arc::new(SystemTimeProvider),
        settings.env_allowlist.clone(),
    ));

    match cli.command {
        Commands::Run {
            program,
            kwargs,
            flags,
            dir,
            dry_run,
            json,
            args,
        } => run_program(runner, program, kwargs, flags, dir, dry_run, json, args),

        Commands::Tools => {
            list_tools(&settings);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Dock {
            receptor,
            rigid,
            flex,
            flexible_residues,
            ligands,
            box_path,
            exhaustiveness,
            name,
            dir,
        } => {
            dock(
                &settings,
                runner,
                receptor,
                rigid,
                flex,
                flexible_residues,
                ligands,
                box_path,
                exhaustiveness,
                name,
                dir,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kwarg() {
        assert_eq!(
            parse_kwarg("exhaustiveness=8").unwrap(),
            ("exhaustiveness".to_string(), ArgValue::Str("8".to_string()))
        );
        assert_eq!(
            parse_kwarg("no_refine=false").unwrap(),
            ("no_refine".to_string(), ArgValue::Bool(false))
        );
        assert_eq!(
            parse_kwarg("out=a=b.pdbqt").unwrap(),
            ("out".to_string(), ArgValue::Str("a=b.pdbqt".to_string()))
        );
        assert!(parse_kwarg("novalue").is_err());
        assert!(parse_kwarg("=1").is_err());
    }

    #[test]
    fn test_exit_code_mapping() {
        let output = |exit_code| ProcessOutput {
            exit_code,
            stdout: Vec::new(),
            stderr: Vec::new(),
            duration_ms: 0,
        };

        assert_eq!(exit_code(&output(Some(0))), ExitCode::SUCCESS);
        assert_eq!(exit_code(&output(Some(3))), ExitCode::from(3));
        assert_eq!(exit_code(&output(Some(255))), ExitCode::from(255));
        assert_eq!(exit_code(&output(Some(-1073741819))), ExitCode::FAILURE);
        assert_eq!(exit_code(&output(Some(256))), ExitCode::FAILURE);
        assert_eq!(exit_code(&output(None)), ExitCode::FAILURE);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
