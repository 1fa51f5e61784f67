//! Checkpointable BLAKE3 digest accumulator.
//!
//! # Overview
//!
//! Candidate files that agree on every block read so far share one
//! [`Digest`] checkpoint. When the next block is read for each member, every
//! member advances its *own copy* of the checkpoint, so siblings branch
//! independently from the same prefix state.
//!
//! Cloning a [`Digest`] copies the BLAKE3 hasher state, which is a bounded
//! chaining-value stack plus one pending chunk. The cost is independent of
//! how many bytes have already been consumed.
//!
//! # Example
//!
//! ```
//! use blockdupe::duplicates::Digest;
//!
//! let checkpoint = Digest::new().advanced(b"shared prefix");
//! let a = checkpoint.advanced(b"tail one");
//! let b = checkpoint.advanced(b"tail two");
//!
//! assert_ne!(a.value(), b.value());
//! assert_eq!(checkpoint.value(), Digest::new().advanced(b"shared prefix").value());
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

/// Length of a finalized digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Streaming content digest that can be checkpointed by cloning.
#[derive(Clone, Default)]
pub struct Digest {
    state: blake3::Hasher,
}

impl Digest {
    /// Create an empty accumulator (no bytes consumed).
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: blake3::Hasher::new(),
        }
    }

    /// Return a new accumulator that has consumed `bytes` after this one.
    ///
    /// `self` is left untouched so it can serve as the checkpoint for
    /// other members of the same group.
    #[must_use]
    pub fn advanced(&self, bytes: &[u8]) -> Self {
        let mut next = self.clone();
        next.update(bytes);
        next
    }

    /// Feed more bytes into this accumulator in place.
    pub fn update(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
    }

    /// Snapshot the digest of everything consumed so far.
    ///
    /// Finalizing does not consume the state; more bytes may follow.
    #[must_use]
    pub fn value(&self) -> DigestValue {
        DigestValue(*self.state.finalize().as_bytes())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Digest").field(&self.value()).finish()
    }
}

/// Fixed-size digest snapshot, usable as a map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DigestValue([u8; DIGEST_LEN]);

impl DigestValue {
    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hexadecimal representation (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.0.iter().fold(String::with_capacity(DIGEST_LEN * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
    }
}

impl From<[u8; DIGEST_LEN]> for DigestValue {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty to tell groups apart in logs.
        write!(f, "DigestValue({}…)", &self.to_hex()[..16])
    }
}

impl Serialize for DigestValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
