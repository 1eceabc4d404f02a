// Tool registry - named external programs (AutoDock Tools, Vina)
use crate::error::{AppError, Result};
use crate::port::ProcessRunner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::command::ToolCommand;

/// AutoDock Tools preparation scripts
pub const AUTODOCK_COMMANDS: &[&str] = &[
    "prepare_receptor",
    "prepare_ligand",
    "prepare_flexreceptor.py",
];

/// AutoDock Vina executable
pub const VINA_COMMAND: &str = "vina";

/// Static description of an external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Display name, e.g. `PREPARE_LIGAND`
    pub name: String,
    /// Executable name or path
    pub program: String,
    /// Launcher placed before `program` (e.g. `python`)
    pub driver: Option<String>,
}

/// Tool factory
pub fn create_tool(
    name: impl Into<String>,
    program: impl Into<String>,
    driver: Option<&str>,
) -> ToolSpec {
    ToolSpec {
        name: name.into(),
        program: program.into(),
        driver: driver.filter(|d| !d.is_empty()).map(str::to_string),
    }
}

/// Tools by lookup key (the command name)
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// AutoDock Tools scripts, optionally run through `driver`
    pub fn autodock(driver: Option<&str>) -> Self {
        let mut registry = Self::new();
        for &command in AUTODOCK_COMMANDS {
            registry.register(command, create_tool(command.to_uppercase(), command, driver));
        }
        registry
    }

    pub fn vina() -> Self {
        let mut registry = Self::new();
        registry.register(
            VINA_COMMAND,
            create_tool(VINA_COMMAND.to_uppercase(), VINA_COMMAND, None),
        );
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, spec: ToolSpec) -> Option<ToolSpec> {
        self.tools.insert(key.into(), spec)
    }

    /// Absorb every tool of `other`; its entries win on key collision
    pub fn extend(&mut self, other: ToolRegistry) {
        self.tools.extend(other.tools);
    }

    pub fn get(&self, key: &str) -> Option<&ToolSpec> {
        self.tools.get(key)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolSpec)> {
        self.tools.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Point every program at `dir` (tool install directory)
    pub fn resolve_in(mut self, dir: &Path) -> Self {
        for spec in self.tools.values_mut() {
            spec.program = dir.join(&spec.program).to_string_lossy().into_owned();
        }
        self
    }

    /// Build a runnable command for the tool registered under `key`
    ///
    /// # Errors
    /// - AppError::NotFound if no such tool is registered
    pub fn bind(&self, key: &str, runner: Arc<dyn ProcessRunner>) -> Result<ToolCommand> {
        let spec = self
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("tool '{}'", key)))?;
        Ok(ToolCommand::new(spec, runner))
    }
}
