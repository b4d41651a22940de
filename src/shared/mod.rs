pub mod error;
pub mod logging;
pub mod result;
pub mod security;
pub mod text;

pub use error::{ExitCode, PipelineError};
pub use result::Result;
