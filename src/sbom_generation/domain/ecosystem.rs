use crate::shared::error::PipelineError;
use std::fmt;
use std::str::FromStr;

/// Project ecosystem declared with a job.
///
/// The set is closed: every variant has exactly one generator strategy and
/// a fixed list of manifest file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ecosystem {
    Python,
    Golang,
    Php,
    JavaScript,
    Rust,
    Java,
    Cpp,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 7] = [
        Ecosystem::Python,
        Ecosystem::Golang,
        Ecosystem::Php,
        Ecosystem::JavaScript,
        Ecosystem::Rust,
        Ecosystem::Java,
        Ecosystem::Cpp,
    ];

    /// Canonical identifier, as accepted on input and stored with a job.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Python => "python",
            Ecosystem::Golang => "golang",
            Ecosystem::Php => "php",
            Ecosystem::JavaScript => "javascript",
            Ecosystem::Rust => "rust",
            Ecosystem::Java => "java",
            Ecosystem::Cpp => "c/c++",
        }
    }

    /// Manifest file names, relative to a project root, in priority order.
    pub const fn manifest_files(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Python => &[
                "requirements.txt",
                "requirements-prod.txt",
                "requirements/prod.txt",
                "requirements/base.txt",
                "requirements.in",
                "poetry.lock",
                "Pipfile.lock",
                "pyproject.toml",
                "setup.py",
            ],
            Ecosystem::Golang => &["go.mod"],
            Ecosystem::Php => &["composer.json"],
            Ecosystem::JavaScript => &["package.json"],
            Ecosystem::Rust => &["Cargo.toml"],
            Ecosystem::Java => &["pom.xml", "build.gradle", "build.gradle.kts"],
            Ecosystem::Cpp => &[
                "CMakeLists.txt",
                "meson.build",
                "conanfile.txt",
                "conanfile.py",
                "vcpkg.json",
                "Makefile",
            ],
        }
    }

    /// Comma separated list of canonical identifiers, for hints.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" => Ok(Ecosystem::Python),
            "golang" | "go" => Ok(Ecosystem::Golang),
            "php" => Ok(Ecosystem::Php),
            "javascript" | "js" => Ok(Ecosystem::JavaScript),
            "rust" => Ok(Ecosystem::Rust),
            "java" => Ok(Ecosystem::Java),
            "c/c++" | "c++" | "cpp" => Ok(Ecosystem::Cpp),
            _ => Err(PipelineError::UnsupportedEcosystem {
                value: s.to_string(),
                supported: Self::supported_list(),
            }),
        }
    }
}
