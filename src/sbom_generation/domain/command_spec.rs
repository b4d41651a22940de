use std::path::{Path, PathBuf};

/// Immutable description of one external generator invocation.
///
/// Arguments are kept as a vector and are never joined into a shell string.
/// `pre_commands` run in order, in the same working directory, and must all
/// succeed before the main command starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    tool_name: String,
    argv: Vec<String>,
    working_dir: PathBuf,
    output_path: PathBuf,
    pre_commands: Vec<Vec<String>>,
}

impl CommandSpec {
    /// Returns `None` when `argv` is empty.
    pub fn new(
        tool_name: impl Into<String>,
        argv: Vec<String>,
        working_dir: PathBuf,
        output_path: PathBuf,
    ) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self {
            tool_name: tool_name.into(),
            argv,
            working_dir,
            output_path,
            pre_commands: Vec::new(),
        })
    }

    /// Appends a pre-command. Empty vectors are ignored.
    pub fn with_pre_command(mut self, argv: Vec<String>) -> Self {
        if !argv.is_empty() {
            self.pre_commands.push(argv);
        }
        self
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn pre_commands(&self) -> &[Vec<String>] {
        &self.pre_commands
    }

    /// Pre-commands followed by the main command.
    pub fn steps(&self) -> impl Iterator<Item = &[String]> {
        self.pre_commands
            .iter()
            .map(|c| c.as_slice())
            .chain(std::iter::once(self.argv.as_slice()))
    }
}

/// Owned argument vector from borrowed parts.
pub fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}
