use super::generators::{strategy_for, GeneratorStrategy};
use super::ToolPath;
use crate::sbom_generation::domain::{CommandSpec, Ecosystem, ExternalProjectId};
use crate::shared::error::PipelineError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// CommandRegistry maps an ecosystem to a generator invocation.
///
/// Resolution goes through a single [`ToolPath`], the same one the process
/// supervisor uses to launch the command.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    tools: ToolPath,
}

impl CommandRegistry {
    pub fn new(tools: ToolPath) -> Self {
        Self { tools }
    }

    /// Command for `ecosystem` in `root`, or `None` when a required tool or
    /// every supported manifest is missing.
    pub fn build(
        &self,
        ecosystem: Ecosystem,
        external_id: &ExternalProjectId,
        root: &Path,
    ) -> Option<CommandSpec> {
        strategy_for(ecosystem).build(root, external_id, &self.tools)
    }

    /// Like [`build`](Self::build), but explains a missing command.
    pub fn build_or_explain(
        &self,
        ecosystem: Ecosystem,
        external_id: &ExternalProjectId,
        root: &Path,
    ) -> Result<CommandSpec, PipelineError> {
        let strategy = strategy_for(ecosystem);

        let missing = strategy.missing_tools(&self.tools);
        if !missing.is_empty() {
            return Err(PipelineError::NoCommandAvailable {
                ecosystem: ecosystem.to_string(),
                reason: format!("tool not found on execution path: {}", missing.join(", ")),
            });
        }

        strategy
            .plan(root, external_id)
            .ok_or_else(|| PipelineError::NoCommandAvailable {
                ecosystem: ecosystem.to_string(),
                reason: format!(
                    "no supported manifest in {} (expected one of: {})",
                    root.display(),
                    ecosystem.manifest_files().join(", ")
                ),
            })
    }

    /// Every tool any strategy needs, with its resolved location.
    pub fn diagnostics(&self) -> BTreeMap<&'static str, Option<PathBuf>> {
        Ecosystem::ALL
            .iter()
            .flat_map(|e| strategy_for(*e).required_tools().iter().copied())
            .map(|tool| (tool, self.tools.resolve(tool)))
            .collect()
    }

    /// Tools required for one ecosystem, with their resolved locations.
    pub fn diagnostics_for(&self, ecosystem: Ecosystem) -> BTreeMap<&'static str, Option<PathBuf>> {
        strategy_for(ecosystem)
            .required_tools()
            .iter()
            .map(|tool| (*tool, self.tools.resolve(tool)))
            .collect()
    }
}
