/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod job_request;

pub use crate::ports::inbound::JobOutcome;
pub use job_request::JobRequest;
