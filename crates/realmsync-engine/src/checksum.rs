//! Whole-realm change detection.
//!
//! The digest of a realm's canonical declared form is stored on the realm
//! itself as a custom attribute. When the stored digest matches the computed
//! one on a later run, the realm's reconciliation is skipped entirely.

use sha3::{Digest, Sha3_512};

use realmsync_types::DesiredRealm;

use crate::error::ImportResult;
use crate::normalize::Canonicalizer;

/// Realm attribute holding the digest of the last applied configuration.
pub const CHECKSUM_ATTRIBUTE: &str = "realmsync.import-checksum";

/// SHA3-512 digests over the canonical serialized form of a declared realm.
#[derive(Debug, Clone, Default)]
pub struct ChecksumService {
    canonicalizer: Canonicalizer,
}

impl ChecksumService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            canonicalizer: Canonicalizer::new(),
        }
    }

    /// Lowercase hex SHA3-512 of raw bytes.
    #[must_use]
    pub fn digest(&self, bytes: &[u8]) -> String {
        let mut hasher = Sha3_512::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Digest of a declared realm's canonical form. Canonicalization sorts
    /// object keys and strips explicit nulls, so semantically identical
    /// declarations digest identically regardless of source formatting.
    pub fn realm_digest(&self, desired: &DesiredRealm) -> ImportResult<String> {
        let bytes = self.canonicalizer.canonical_bytes(desired)?;
        Ok(self.digest(&bytes))
    }
}
