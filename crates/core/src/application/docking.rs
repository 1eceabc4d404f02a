// Docking job - one Vina run over a receptor and one or more ligands
use crate::domain::ArgValue;
use crate::error::{AppError, Result};
use crate::port::ProcessOutput;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use super::command::{Invocation, ToolCommand};

/// Vina's own default search exhaustiveness
pub const DEFAULT_EXHAUSTIVENESS: u32 = 8;

/// Prepared receptor
///
/// A receptor with flexible residues is docked from its split rigid/flex
/// PDBQT pair; otherwise `pdbqt` is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receptor {
    pub name: String,
    pub pdbqt: Option<PathBuf>,
    pub rigid_pdbqt: Option<PathBuf>,
    pub flex_pdbqt: Option<PathBuf>,
    #[serde(default)]
    pub flexible_residues: Vec<String>,
}

impl Receptor {
    pub fn rigid(name: impl Into<String>, pdbqt: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            pdbqt: Some(pdbqt.into()),
            rigid_pdbqt: None,
            flex_pdbqt: None,
            flexible_residues: Vec::new(),
        }
    }

    pub fn flexible(
        name: impl Into<String>,
        rigid_pdbqt: impl Into<PathBuf>,
        flex_pdbqt: impl Into<PathBuf>,
        flexible_residues: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pdbqt: None,
            rigid_pdbqt: Some(rigid_pdbqt.into()),
            flex_pdbqt: Some(flex_pdbqt.into()),
            flexible_residues,
        }
    }

    pub fn is_flexible(&self) -> bool {
        !self.flexible_residues.is_empty()
    }
}

/// Prepared ligand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ligand {
    pub name: String,
    pub pdbqt: PathBuf,
}

impl Ligand {
    pub fn new(name: impl Into<String>, pdbqt: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            pdbqt: pdbqt.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DockingMode {
    Rigid,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DockingScope {
    Single,
    Batch,
}

/// Everything one docking run needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockingRequest {
    pub id: String,
    pub receptor: Option<Receptor>,
    pub ligands: Vec<Ligand>,
    /// Vina config file holding the search box
    pub box_path: Option<PathBuf>,
    pub exhaustiveness: u32,
    pub working_dir: Option<PathBuf>,
}

impl DockingRequest {
    pub fn new(receptor: Receptor, ligands: Vec<Ligand>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            receptor: Some(receptor),
            ligands,
            box_path: None,
            exhaustiveness: DEFAULT_EXHAUSTIVENESS,
            working_dir: None,
        }
    }

    pub fn with_box(mut self, box_path: impl Into<PathBuf>) -> Self {
        self.box_path = Some(box_path.into());
        self
    }

    pub fn with_exhaustiveness(mut self, exhaustiveness: u32) -> Self {
        self.exhaustiveness = exhaustiveness;
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Result of a finished Vina run (exit code reported, not interpreted)
#[derive(Debug, Clone)]
pub struct DockingOutcome {
    pub job_id: String,
    pub mode: DockingMode,
    pub scope: DockingScope,
    /// Vina `--out` file, relative to the working directory
    pub output_file: PathBuf,
    pub output: ProcessOutput,
}

/// Output file name for a run
pub fn output_file_name(receptor: &str, mode: DockingMode, scope: DockingScope) -> String {
    match (mode, scope) {
        (DockingMode::Rigid, _) => format!("vina_result_{}.pdbqt", receptor),
        (DockingMode::Flexible, DockingScope::Single) => {
            format!("vina_result_{}_flexible.pdbqt", receptor)
        }
        (DockingMode::Flexible, DockingScope::Batch) => {
            format!("vina_multidock_result_{}_flexible.pdbqt", receptor)
        }
    }
}

/// Runs docking jobs through a bound `vina` command
#[derive(Debug, Clone)]
pub struct DockingService {
    vina: ToolCommand,
}

impl DockingService {
    pub fn new(vina: ToolCommand) -> Self {
        Self { vina }
    }

    /// Validate the request and turn it into Vina call-time arguments
    ///
    /// # Errors
    /// - AppError::Validation if there are no ligands, no receptor, or a
    ///   flexible receptor lacks its rigid/flex pair
    pub fn plan(&self, request: &DockingRequest) -> Result<(Invocation, DockingMode, DockingScope)> {
        if request.ligands.is_empty() {
            return Err(AppError::Validation(
                "There are no ligands to dock".to_string(),
            ));
        }

        let receptor = request.receptor.as_ref().ok_or_else(|| {
            AppError::Validation(
                "No receptor loaded; generate and load the receptor first".to_string(),
            )
        })?;

        let scope = if request.ligands.len() == 1 {
            DockingScope::Single
        } else {
            DockingScope::Batch
        };

        let mut invocation = Invocation::new();

        let mode = if receptor.is_flexible() {
            match (&receptor.rigid_pdbqt, &receptor.flex_pdbqt) {
                (Some(rigid), Some(flex)) => {
                    invocation = invocation.kwarg("receptor", rigid).kwarg("flex", flex);
                    DockingMode::Flexible
                }
                _ => {
                    return Err(AppError::Validation(format!(
                        "Receptor '{}' has flexible residues but no rigid/flex structures",
                        receptor.name
                    )))
                }
            }
        } else {
            let pdbqt = receptor.pdbqt.as_ref().ok_or_else(|| {
                AppError::Validation(format!("Receptor '{}' has no PDBQT file", receptor.name))
            })?;
            invocation = invocation.kwarg("receptor", pdbqt);
            DockingMode::Rigid
        };

        let ligand = match scope {
            DockingScope::Single => ArgValue::from(&request.ligands[0].pdbqt),
            DockingScope::Batch => ArgValue::List(
                request
                    .ligands
                    .iter()
                    .map(|l| ArgValue::from(&l.pdbqt))
                    .collect(),
            ),
        };
        invocation = invocation.kwarg("ligand", ligand);

        if let Some(box_path) = &request.box_path {
            invocation = invocation.kwarg("config", box_path);
        }

        invocation = invocation
            .kwarg("exhaustiveness", request.exhaustiveness)
            .kwarg("out", output_file_name(&receptor.name, mode, scope));

        if let Some(dir) = &request.working_dir {
            invocation = invocation.in_dir(dir);
        }

        Ok((invocation, mode, scope))
    }

    /// Run Vina for the request and wait for it to finish
    pub fn dock(&self, request: &DockingRequest) -> Result<DockingOutcome> {
        let (invocation, mode, scope) = self.plan(request)?;

        info!(
            job_id = %request.id,
            mode = ?mode,
            scope = ?scope,
            ligands = request.ligands.len(),
            "Starting docking"
        );

        let output_file = invocation
            .kwargs
            .get("out")
            .map(|v| PathBuf::from(v.to_string()))
            .unwrap_or_default();

        let output = self.vina.execute(&invocation)?;

        Ok(DockingOutcome {
            job_id: request.id.clone(),
            mode,
            scope,
            output_file,
            output,
        })
    }
}
