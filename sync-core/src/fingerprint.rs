//! Content fingerprints.
//!
//! A fingerprint is the hex-encoded digest of a save file's bytes. Values
//! arrive from three places (the local hasher, the remote hash record, the
//! local cache file) and are only ever compared after normalization:
//! surrounding whitespace trimmed, hex digits lowercased.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fingerprint parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    /// Input was empty after trimming.
    #[error("fingerprint is empty")]
    Empty,

    /// Input contained a non-hex character.
    #[error("fingerprint contains non-hex character {0:?}")]
    InvalidCharacter(char),
}

/// Normalized hex digest of a file's content.
///
/// Construction always normalizes, so two `Fingerprint`s compare equal iff
/// their hex digits match case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse and normalize a fingerprint from text.
    pub fn parse(raw: &str) -> Result<Self, FingerprintError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FingerprintError::Empty);
        }
        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(FingerprintError::InvalidCharacter(bad));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Build a fingerprint from raw digest bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// The normalized lowercase hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}
