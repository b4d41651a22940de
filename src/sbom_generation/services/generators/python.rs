use super::{artifact_in, first_existing, GeneratorStrategy};
use crate::sbom_generation::domain::{argv, CommandSpec, Ecosystem, ExternalProjectId};
use std::path::Path;

const TOOL: &str = "cyclonedx-py";

/// Requirement files, highest priority first.
const REQUIREMENT_FILES: &[&str] = &[
    "requirements.txt",
    "requirements-prod.txt",
    "requirements/prod.txt",
    "requirements/base.txt",
    "requirements.in",
];

/// `cyclonedx-py` over a requirements file, a Poetry lock or a Pipenv lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonGenerator;

impl GeneratorStrategy for PythonGenerator {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &[TOOL]
    }

    fn plan(&self, root: &Path, external_id: &ExternalProjectId) -> Option<CommandSpec> {
        let (output, output_path) = artifact_in(root, external_id);

        let args = if let Some(requirements) = first_existing(root, REQUIREMENT_FILES) {
            argv(&[TOOL, "requirements", requirements, "-o", output.as_str()])
        } else if root.join("poetry.lock").is_file() {
            argv(&[TOOL, "poetry", ".", "-o", output.as_str()])
        } else if root.join("Pipfile.lock").is_file() {
            argv(&[TOOL, "pipenv", ".", "-o", output.as_str()])
        } else {
            return None;
        };

        CommandSpec::new(TOOL, args, root.to_path_buf(), output_path)
    }
}
