/// Application layer - Use cases and DTOs
///
/// This layer contains the application logic that orchestrates
/// domain services and coordinates with infrastructure through ports.
pub mod dto;
mod job_scheduler;
pub mod use_cases;

pub use job_scheduler::JobScheduler;
