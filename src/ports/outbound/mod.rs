/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the pipeline core uses
/// to interact with external systems (status storage, tracking service,
/// operating-system processes).
pub mod process_runner;
pub mod status_repository;
pub mod tracking_service;

pub use process_runner::ProcessRunner;
pub use status_repository::{ensure_transition, StatusRepository};
pub use tracking_service::{PageRequest, TrackingQueries, TrackingService};
