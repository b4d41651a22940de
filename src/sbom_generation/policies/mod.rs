mod extraction_limits;
mod retry_policy;

pub use extraction_limits::{ExtractionLimits, DEFAULT_MAX_MEMBERS, DEFAULT_MAX_TOTAL_BYTES};
pub use retry_policy::RetryPolicy;
