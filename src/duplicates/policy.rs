//! Per-round I/O policy: keep handles open or reopen them for every block.
//!
//! While more candidates are live than handles may be open, every block is
//! read with an open/seek/read/close cycle and the block is enlarged by the
//! chunk factor so fewer cycles are needed per byte. Once the live count
//! fits under the ceiling, handles stay open between rounds and the base
//! block size is used.

use super::engine::EngineConfig;

/// How file handles are managed during one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleMode {
    /// Handles stay open and positioned between rounds.
    Open,
    /// Every read opens, seeks, reads once and closes.
    Close,
}

impl std::fmt::Display for HandleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// Handle mode and block size for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    /// Handle retention mode
    pub mode: HandleMode,
    /// Bytes read per member per round
    pub block_size: u64,
}

impl ResourcePolicy {
    /// Pick the policy for a round with `live` candidates.
    #[must_use]
    pub fn evaluate(live: usize, config: &EngineConfig) -> Self {
        if live > config.max_open_handles {
            Self::closed(config)
        } else {
            Self::open(config)
        }
    }

    /// Open-handle policy at the base block size.
    #[must_use]
    pub fn open(config: &EngineConfig) -> Self {
        Self {
            mode: HandleMode::Open,
            block_size: config.block_size as u64,
        }
    }

    /// Close-after-read policy with the amplified block size.
    #[must_use]
    pub fn closed(config: &EngineConfig) -> Self {
        Self {
            mode: HandleMode::Close,
            block_size: (config.block_size as u64)
                .saturating_mul(config.closed_handle_chunk_factor as u64),
        }
    }
}
