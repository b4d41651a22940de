/// Status persistence adapters
mod in_memory_status_store;
mod json_file_status_store;

pub use in_memory_status_store::InMemoryStatusStore;
pub use json_file_status_store::JsonFileStatusStore;
