/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (e.g., CLI)
/// use to interact with the pipeline core.
pub mod pipeline_port;

pub use pipeline_port::{JobOutcome, PipelinePort};
