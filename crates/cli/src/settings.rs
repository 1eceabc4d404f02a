//! Configuration loading
//!
//! Layers, lowest to highest precedence: built-in defaults, TOML file
//! (`--config` / `DOCKWRAP_CONFIG`, else `~/.dockwrap/config.toml` if it
//! exists), then `DOCKWRAP_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use dockwrap_core::application::docking::DEFAULT_EXHAUSTIVENESS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "~/.dockwrap/config.toml";
const ENV_PREFIX: &str = "DOCKWRAP";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Directory docking jobs run in
    pub working_dir: Option<PathBuf>,
    /// Vina config file holding the search box
    pub box_path: Option<PathBuf>,
    #[serde(default = "default_exhaustiveness")]
    pub exhaustiveness: u32,
    /// Directory holding the `vina` executable
    pub vina_dir: Option<PathBuf>,
    /// Directory holding the AutoDock Tools scripts
    pub autodock_tools_dir: Option<PathBuf>,
    /// Launcher for the AutoDock Tools scripts (e.g. `pythonsh`)
    pub autodock_driver: Option<String>,
    /// Unset: children inherit the whole environment
    pub env_allowlist: Option<Vec<String>>,
}

fn default_exhaustiveness() -> u32 {
    DEFAULT_EXHAUSTIVENESS
}

fn expand(path: Option<PathBuf>) -> Option<PathBuf> {
    path.map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()))
}

impl Settings {
    /// Load settings; an explicit `path` must exist, the default one may not
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (
                PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).into_owned()),
                false,
            ),
        };

        let settings: Settings = Config::builder()
            .set_default("exhaustiveness", i64::from(DEFAULT_EXHAUSTIVENESS))?
            .add_source(
                File::new(&file.to_string_lossy(), FileFormat::Toml).required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("env_allowlist"),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        Ok(settings.expanded())
    }

    fn expanded(self) -> Self {
        Self {
            working_dir: expand(self.working_dir),
            box_path: expand(self.box_path),
            vina_dir: expand(self.vina_dir),
            autodock_tools_dir: expand(self.autodock_tools_dir),
            ..self
        }
    }
}
