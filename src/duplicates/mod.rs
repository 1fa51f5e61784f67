//! Duplicate detection engine.
//!
//! This module provides:
//! - Size-based grouping of collected files ([`groups`])
//! - A checkpointable content digest ([`digest`])
//! - Per-size-class resolution ([`session`]) through quick-scan sampling,
//!   whole-file hashing on expensive media and incremental block-wise
//!   comparison
//! - Open-file accounting shared by all size-classes ([`handles`])
//! - The [`DuplicateFinder`] tying it together ([`finder`])

pub mod comparator;
pub mod digest;
pub mod engine;
pub mod finder;
pub mod groups;
pub mod handles;
pub mod policy;
pub mod quick_scan;
pub mod sequential;
pub mod session;

pub use digest::{Digest, DigestValue, DIGEST_LEN};
pub use engine::{
    EngineConfig, EngineConfigError, MediaSeekCost, DEFAULT_BLOCK_SIZE,
    DEFAULT_CLOSED_HANDLE_CHUNK_FACTOR, DEFAULT_MAX_OPEN_HANDLES, DEFAULT_QUICK_SCAN_SAMPLES,
    DEFAULT_QUICK_SCAN_THRESHOLD,
};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{
    group_by_size, CandidateGroup, DuplicateSet, FileId, GroupSplitter, GroupingStats,
    SizeClasses,
};
pub use handles::{HandleBudget, HandleTable, Reservation};
pub use policy::{HandleMode, ResourcePolicy};
pub use quick_scan::sample_offsets;
pub use session::{ComparisonSession, SessionStats, SizeClassOutcome};
