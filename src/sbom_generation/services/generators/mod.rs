//! One generator strategy per ecosystem.
//!
//! Each strategy checks its own preconditions: every tool it needs must
//! resolve on the tool path, and the project root must contain a manifest
//! it understands. Otherwise it yields no command.

mod cdxgen;
mod golang;
mod javascript;
mod php;
mod python;
mod rust;

use crate::sbom_generation::domain::{CommandSpec, Ecosystem, ExternalProjectId};
use crate::sbom_generation::services::ToolPath;
use std::path::{Path, PathBuf};

pub use cdxgen::CdxgenGenerator;
pub use golang::GoModGenerator;
pub use javascript::NpmGenerator;
pub use php::ComposerGenerator;
pub use python::PythonGenerator;
pub use rust::CargoGenerator;

/// Capability to produce a command for one ecosystem.
pub trait GeneratorStrategy: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;

    /// Executables that must all resolve before a command is produced.
    fn required_tools(&self) -> &'static [&'static str];

    /// Builds the invocation for `root`, or `None` when no supported
    /// manifest is present.
    fn plan(&self, root: &Path, external_id: &ExternalProjectId) -> Option<CommandSpec>;

    fn missing_tools(&self, tools: &ToolPath) -> Vec<&'static str> {
        self.required_tools()
            .iter()
            .copied()
            .filter(|name| tools.resolve(name).is_none())
            .collect()
    }

    fn build(
        &self,
        root: &Path,
        external_id: &ExternalProjectId,
        tools: &ToolPath,
    ) -> Option<CommandSpec> {
        if !self.missing_tools(tools).is_empty() {
            return None;
        }
        self.plan(root, external_id)
    }
}

static PYTHON: PythonGenerator = PythonGenerator;
static GOLANG: GoModGenerator = GoModGenerator;
static PHP: ComposerGenerator = ComposerGenerator;
static JAVASCRIPT: NpmGenerator = NpmGenerator;
static RUST: CargoGenerator = CargoGenerator;
static JAVA: CdxgenGenerator = CdxgenGenerator::java();
static CPP: CdxgenGenerator = CdxgenGenerator::cpp();

/// The strategy registered for `ecosystem`.
pub fn strategy_for(ecosystem: Ecosystem) -> &'static dyn GeneratorStrategy {
    match ecosystem {
        Ecosystem::Python => &PYTHON,
        Ecosystem::Golang => &GOLANG,
        Ecosystem::Php => &PHP,
        Ecosystem::JavaScript => &JAVASCRIPT,
        Ecosystem::Rust => &RUST,
        Ecosystem::Java => &JAVA,
        Ecosystem::Cpp => &CPP,
    }
}

/// First candidate that exists as a file below `root`.
pub(crate) fn first_existing(root: &Path, candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|name| root.join(name).is_file())
}

/// Artifact file name and its absolute location below `root`.
pub(crate) fn artifact_in(root: &Path, external_id: &ExternalProjectId) -> (String, PathBuf) {
    let file_name = external_id.artifact_file_name();
    let path = root.join(&file_name);
    (file_name, path)
}
