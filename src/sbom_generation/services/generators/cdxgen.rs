use super::{artifact_in, first_existing, GeneratorStrategy};
use crate::sbom_generation::domain::{argv, CommandSpec, Ecosystem, ExternalProjectId};
use std::path::Path;

const TOOL: &str = "cdxgen";
const SPEC_VERSION: &str = "1.6";

/// `cdxgen` for the ecosystems without a dedicated CycloneDX tool.
#[derive(Debug, Clone, Copy)]
pub struct CdxgenGenerator {
    ecosystem: Ecosystem,
    project_type: &'static str,
    manifests: &'static [&'static str],
}

impl CdxgenGenerator {
    pub const fn java() -> Self {
        Self {
            ecosystem: Ecosystem::Java,
            project_type: "java",
            manifests: Ecosystem::Java.manifest_files(),
        }
    }

    pub const fn cpp() -> Self {
        Self {
            ecosystem: Ecosystem::Cpp,
            project_type: "c",
            manifests: Ecosystem::Cpp.manifest_files(),
        }
    }
}

impl GeneratorStrategy for CdxgenGenerator {
    fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &[TOOL]
    }

    fn plan(&self, root: &Path, external_id: &ExternalProjectId) -> Option<CommandSpec> {
        first_existing(root, self.manifests)?;
        let (output, output_path) = artifact_in(root, external_id);
        CommandSpec::new(
            TOOL,
            argv(&[
                TOOL,
                "-t",
                self.project_type,
                "-o",
                output.as_str(),
                "--spec-version",
                SPEC_VERSION,
            ]),
            root.to_path_buf(),
            output_path,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::services::generators::test_support::{external_id, project};

    #[test]
    fn test_java_gradle() {
        let dir = project(&["build.gradle.kts"]);
        let spec = CdxgenGenerator::java().plan(dir.path(), &external_id()).unwrap();
        assert_eq!(spec.argv()[2], "java");
        assert_eq!(spec.argv()[6], SPEC_VERSION);
    }

    #[test]
    fn test_cpp_cmake() {
        let dir = project(&["CMakeLists.txt"]);
        let spec = CdxgenGenerator::cpp().plan(dir.path(), &external_id()).unwrap();
        assert_eq!(spec.argv()[2], "c");
    }

    #[test]
    fn test_java_without_build_file() {
        let dir = project(&["Main.java"]);
        assert!(CdxgenGenerator::java().plan(dir.path(), &external_id()).is_none());
    }
}
