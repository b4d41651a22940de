/// Use cases module containing application business logic orchestration
mod delete_project;
mod run_pipeline;
mod submit_job;

pub use delete_project::DeleteProjectUseCase;
pub use run_pipeline::{RunPipelineUseCase, StatusWritePolicy, DEFAULT_GENERATION_TIMEOUT};
pub use submit_job::{SubmitJobUseCase, SubmittedJob};
