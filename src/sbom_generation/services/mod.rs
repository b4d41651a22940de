mod archive_extractor;
mod command_registry;
pub mod generators;
mod root_locator;
mod tool_path;

pub use archive_extractor::{detect_format, ArchiveExtractor, ArchiveFormat, ExtractionSummary};
pub use command_registry::CommandRegistry;
pub use generators::GeneratorStrategy;
pub use root_locator::ProjectRootLocator;
pub use tool_path::ToolPath;
