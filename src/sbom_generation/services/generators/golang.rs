use super::{artifact_in, GeneratorStrategy};
use crate::sbom_generation::domain::{argv, CommandSpec, Ecosystem, ExternalProjectId};
use std::path::Path;

const TOOL: &str = "cyclonedx-gomod";

/// `cyclonedx-gomod mod` over a Go module.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoModGenerator;

impl GeneratorStrategy for GoModGenerator {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Golang
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &[TOOL]
    }

    fn plan(&self, root: &Path, external_id: &ExternalProjectId) -> Option<CommandSpec> {
        if !root.join("go.mod").is_file() {
            return None;
        }
        let (output, output_path) = artifact_in(root, external_id);
        CommandSpec::new(
            TOOL,
            argv(&[TOOL, "mod", "-json", "-output", output.as_str()]),
            root.to_path_buf(),
            output_path,
        )
    }
}
