// Tool locator - find tool executables in an install directory or on PATH
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves program names to executable files
///
/// An explicit install directory is searched before the `PATH` entries.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    search_dirs: Vec<PathBuf>,
}

impl ToolLocator {
    /// Locator over `install_dir` (if any) followed by the current `PATH`
    pub fn new(install_dir: Option<&Path>) -> Self {
        Self::with_path(install_dir, env::var_os("PATH"))
    }

    /// Locator over `install_dir` followed by an explicit PATH-style list
    pub fn with_path(install_dir: Option<&Path>, path: Option<OsString>) -> Self {
        let mut search_dirs: Vec<PathBuf> = install_dir.map(Path::to_path_buf).into_iter().collect();
        if let Some(path) = path {
            search_dirs.extend(env::split_paths(&path));
        }
        Self { search_dirs }
    }

    /// First executable match for `program`
    ///
    /// A program containing a path separator is checked as-is.
    pub fn locate(&self, program: &str) -> Option<PathBuf> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }

        let found = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(program))
            .find(|path| is_executable(path));

        debug!(program = %program, found = ?found, "Tool lookup");
        found
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
