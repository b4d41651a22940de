use super::{artifact_in, GeneratorStrategy};
use crate::sbom_generation::domain::{argv, CommandSpec, Ecosystem, ExternalProjectId};
use std::path::Path;

/// `cargo cyclonedx`. The subcommand is a separate binary, so both have to
/// be installed. `--override-filename` takes the name without extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoGenerator;

impl GeneratorStrategy for CargoGenerator {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &["cargo", "cargo-cyclonedx"]
    }

    fn plan(&self, root: &Path, external_id: &ExternalProjectId) -> Option<CommandSpec> {
        if !root.join("Cargo.toml").is_file() {
            return None;
        }
        let (_, output_path) = artifact_in(root, external_id);
        CommandSpec::new(
            "cargo-cyclonedx",
            argv(&[
                "cargo",
                "cyclonedx",
                "-f",
                "json",
                "--override-filename",
                external_id.as_str(),
            ]),
            root.to_path_buf(),
            output_path,
        )
    }
}
