/// Process adapters for running external generator tools
mod process_supervisor;

pub use process_supervisor::{ProcessSupervisor, DEFAULT_OUTPUT_LIMIT_CHARS};
