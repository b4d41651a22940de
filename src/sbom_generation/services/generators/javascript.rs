use super::{artifact_in, GeneratorStrategy};
use crate::sbom_generation::domain::{argv, CommandSpec, Ecosystem, ExternalProjectId};
use std::path::Path;

const TOOL: &str = "cyclonedx-npm";

#[derive(Debug, Clone, Copy, Default)]
pub struct NpmGenerator;

impl GeneratorStrategy for NpmGenerator {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::JavaScript
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &[TOOL]
    }

    fn plan(&self, root: &Path, external_id: &ExternalProjectId) -> Option<CommandSpec> {
        if !root.join("package.json").is_file() {
            return None;
        }
        let (output, output_path) = artifact_in(root, external_id);
        CommandSpec::new(
            TOOL,
            argv(&[
                TOOL,
                "package.json",
                "--output-format",
                "JSON",
                "--output-file",
                output.as_str(),
            ]),
            root.to_path_buf(),
            output_path,
        )
    }
}
