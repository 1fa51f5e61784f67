//! Tunables of the comparison engine.

use serde::{Deserialize, Serialize};

/// Default block size for incremental reads (64 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;
/// Default ceiling for simultaneously open file handles.
pub const DEFAULT_MAX_OPEN_HANDLES: usize = 500;
/// Default minimum size (exclusive) for the quick-scan pass.
pub const DEFAULT_QUICK_SCAN_THRESHOLD: u64 = 1_000_000;
/// Default number of interior quick-scan samples.
pub const DEFAULT_QUICK_SCAN_SAMPLES: usize = 10;
/// Default block multiplier used while handles are closed after every read.
pub const DEFAULT_CLOSED_HANDLE_CHUNK_FACTOR: usize = 10;

/// Relative cost of a seek on the storage holding the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSeekCost {
    /// Seeking is cheap (SSD, RAM disk): interleave blocks across files and
    /// stop reading a file as soon as it is known to be unique.
    #[default]
    Cheap,
    /// Seeking is expensive (spinning disk): read each surviving candidate
    /// start-to-finish in one sequential pass.
    Expensive,
}

impl std::fmt::Display for MediaSeekCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cheap => write!(f, "cheap"),
            Self::Expensive => write!(f, "expensive"),
        }
    }
}

/// Errors for out-of-range engine settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineConfigError {
    /// Block size must be positive.
    #[error("block size must be greater than zero")]
    ZeroBlockSize,

    /// Handle ceiling must be positive.
    #[error("max open handles must be greater than zero")]
    ZeroMaxOpenHandles,

    /// Quick-scan needs room for at least two interior samples.
    #[error("quick-scan sample count must be at least 2 (got {0})")]
    TooFewSamples(usize),

    /// Chunk factor must be at least one.
    #[error("closed-handle chunk factor must be at least 1")]
    ZeroChunkFactor,

    /// At least one worker is required.
    #[error("job count must be at least 1")]
    ZeroJobs,
}

/// Settings that drive one run of the comparison engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Whether the sequential whole-file hasher replaces interleaved reads.
    pub media_seek_cost: MediaSeekCost,
    /// Base block size for reads, in bytes.
    pub block_size: usize,
    /// Process-wide ceiling for simultaneously open handles.
    pub max_open_handles: usize,
    /// Files strictly larger than this are quick-scanned; 0 disables it.
    pub quick_scan_threshold: u64,
    /// Number of interior quick-scan samples (head and tail come on top).
    pub quick_scan_samples: usize,
    /// Block multiplier while handles are reopened for every read.
    pub closed_handle_chunk_factor: usize,
    /// Number of size-classes resolved concurrently.
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            media_seek_cost: MediaSeekCost::Cheap,
            block_size: DEFAULT_BLOCK_SIZE,
            max_open_handles: DEFAULT_MAX_OPEN_HANDLES,
            quick_scan_threshold: DEFAULT_QUICK_SCAN_THRESHOLD,
            quick_scan_samples: DEFAULT_QUICK_SCAN_SAMPLES,
            closed_handle_chunk_factor: DEFAULT_CLOSED_HANDLE_CHUNK_FACTOR,
            jobs: 1,
        }
    }
}

impl EngineConfig {
    /// Set the media seek cost.
    #[must_use]
    pub fn with_media_seek_cost(mut self, cost: MediaSeekCost) -> Self {
        self.media_seek_cost = cost;
        self
    }

    /// Set the base block size.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the open-handle ceiling.
    #[must_use]
    pub fn with_max_open_handles(mut self, max: usize) -> Self {
        self.max_open_handles = max;
        self
    }

    /// Set the quick-scan threshold (0 disables quick-scan).
    #[must_use]
    pub fn with_quick_scan_threshold(mut self, threshold: u64) -> Self {
        self.quick_scan_threshold = threshold;
        self
    }

    /// Set the number of interior quick-scan samples.
    #[must_use]
    pub fn with_quick_scan_samples(mut self, samples: usize) -> Self {
        self.quick_scan_samples = samples;
        self
    }

    /// Set the closed-handle chunk factor.
    #[must_use]
    pub fn with_closed_handle_chunk_factor(mut self, factor: usize) -> Self {
        self.closed_handle_chunk_factor = factor;
        self
    }

    /// Set the number of concurrently resolved size-classes.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Check that every setting is in range.
    ///
    /// # Errors
    ///
    /// Returns the first [`EngineConfigError`] found.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.block_size == 0 {
            return Err(EngineConfigError::ZeroBlockSize);
        }
        if self.max_open_handles == 0 {
            return Err(EngineConfigError::ZeroMaxOpenHandles);
        }
        if self.quick_scan_samples < 2 {
            return Err(EngineConfigError::TooFewSamples(self.quick_scan_samples));
        }
        if self.closed_handle_chunk_factor == 0 {
            return Err(EngineConfigError::ZeroChunkFactor);
        }
        if self.jobs == 0 {
            return Err(EngineConfigError::ZeroJobs);
        }
        Ok(())
    }

    /// Whether a size-class of `size` bytes gets a quick-scan pass.
    #[must_use]
    pub fn quick_scan_applies(&self, size: u64) -> bool {
        self.quick_scan_threshold > 0 && size > self.quick_scan_threshold
    }
}
