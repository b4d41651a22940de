pub mod command_spec;
pub mod ecosystem;
pub mod job;
pub mod process_result;
pub mod status;

pub use command_spec::{argv, CommandSpec};
pub use ecosystem::Ecosystem;
pub use job::{ExternalProjectId, Job, JobId, STATUS_DIR_NAME};
pub use process_result::{ProcessOutcome, ProcessResult};
pub use status::{JobStatus, StatusRecord};
