use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Search path used to resolve generator tools.
///
/// Configured tool directories come first, followed by the `PATH` inherited
/// at construction time. The same ordering is handed to child processes, so
/// resolution does not depend on how this process was launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPath {
    dirs: Vec<PathBuf>,
}

impl ToolPath {
    /// Configured directories followed by the current `PATH`.
    pub fn from_env(tool_dirs: &[PathBuf]) -> Self {
        let inherited = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect::<Vec<_>>())
            .unwrap_or_default();
        Self::with_dirs(tool_dirs.iter().cloned().chain(inherited))
    }

    /// Exactly the given directories, de-duplicated in order.
    pub fn with_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if dir.as_os_str().is_empty() || unique.contains(&dir) {
                continue;
            }
            unique.push(dir);
        }
        Self { dirs: unique }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Resolves an executable name to its first match on the search path.
    ///
    /// Names containing a path separator are checked as given.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        if name.contains('/') || name.contains('\\') {
            let candidate = PathBuf::from(name);
            return is_executable(&candidate).then_some(candidate);
        }

        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }

    /// `PATH` value for child processes.
    pub fn search_path(&self) -> OsString {
        env::join_paths(&self.dirs).unwrap_or_default()
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
