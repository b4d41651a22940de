/// Mock implementations for testing
mod mock_status_repository;
mod mock_tracking_service;

pub use mock_status_repository::RecordingStatusRepository;
pub use mock_tracking_service::RecordingTrackingService;
