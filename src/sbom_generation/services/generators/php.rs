use super::{artifact_in, GeneratorStrategy};
use crate::sbom_generation::domain::{argv, CommandSpec, Ecosystem, ExternalProjectId};
use std::path::Path;

const TOOL: &str = "composer";

/// Composer's CycloneDX plugin. Dependencies are resolved first so the
/// plugin sees a complete lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposerGenerator;

impl GeneratorStrategy for ComposerGenerator {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &[TOOL]
    }

    fn plan(&self, root: &Path, external_id: &ExternalProjectId) -> Option<CommandSpec> {
        if !root.join("composer.json").is_file() {
            return None;
        }
        let (output, output_path) = artifact_in(root, external_id);
        let output_arg = format!("--output-file={}", output);

        CommandSpec::new(
            TOOL,
            argv(&[TOOL, "CycloneDX:make-sbom", "--output-format=JSON", output_arg.as_str()]),
            root.to_path_buf(),
            output_path,
        )
        .map(|spec| {
            spec.with_pre_command(argv(&[TOOL, "update", "--no-interaction", "--no-scripts"]))
        })
    }
}
