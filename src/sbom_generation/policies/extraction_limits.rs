use crate::shared::error::PipelineError;

/// Default ceiling on the number of archive members.
pub const DEFAULT_MAX_MEMBERS: usize = 20_000;
/// Default ceiling on cumulative uncompressed size (1 GiB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 1024 * 1024 * 1024;

/// ExtractionLimits policy for untrusted archives
///
/// Both ceilings are checked against member headers before any bytes are
/// written, and the byte ceiling is re-checked while writing so that a
/// header understating its size cannot get past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    pub max_members: usize,
    pub max_total_bytes: u64,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_members: DEFAULT_MAX_MEMBERS,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

impl ExtractionLimits {
    pub fn new(max_members: usize, max_total_bytes: u64) -> Self {
        Self {
            max_members,
            max_total_bytes,
        }
    }

    pub fn check_member_count(&self, count: usize) -> Result<(), PipelineError> {
        if count > self.max_members {
            return Err(PipelineError::QuotaExceeded {
                details: format!(
                    "archive has more than {} members",
                    self.max_members
                ),
            });
        }
        Ok(())
    }

    pub fn check_total_bytes(&self, total: u64) -> Result<(), PipelineError> {
        if total > self.max_total_bytes {
            return Err(PipelineError::QuotaExceeded {
                details: format!(
                    "uncompressed size exceeds {} bytes",
                    self.max_total_bytes
                ),
            });
        }
        Ok(())
    }
}
