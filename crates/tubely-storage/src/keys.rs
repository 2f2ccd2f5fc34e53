//! Storage key derivation.
//!
//! Keys are random, never content-derived: two identical uploads get two
//! different keys.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use thiserror::Error;
use tubely_core::constants::STORAGE_KEY_ENTROPY_BYTES;
use tubely_core::KeyEncoding;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Entropy source unavailable: {0}")]
    EntropySource(String),
}

/// Source of key material. Implementations must fail rather than return weak bytes.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), KeyError>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), KeyError> {
        let mut rng = OsRng;
        rng.try_fill_bytes(dest)
            .map_err(|e| KeyError::EntropySource(e.to_string()))
    }
}

/// Object key within a bucket or storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading namespace segment including its slash, e.g. `landscape/`.
    pub fn prefix(&self) -> Option<&str> {
        self.0.find('/').map(|idx| &self.0[..=idx])
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds `{prefix}{token}{extension}` keys.
#[derive(Clone)]
pub struct KeyDeriver {
    entropy: Arc<dyn EntropySource>,
    encoding: KeyEncoding,
}

impl KeyDeriver {
    pub fn new(encoding: KeyEncoding) -> Self {
        Self::with_entropy(Arc::new(OsEntropy), encoding)
    }

    pub fn with_entropy(entropy: Arc<dyn EntropySource>, encoding: KeyEncoding) -> Self {
        Self { entropy, encoding }
    }

    /// Derive a fresh key. A failing entropy source aborts; there is no fallback.
    pub fn derive_key(&self, prefix: &str, extension: &str) -> Result<StorageKey, KeyError> {
        let mut bytes = [0u8; STORAGE_KEY_ENTROPY_BYTES];
        self.entropy.fill(&mut bytes)?;

        let token = match self.encoding {
            KeyEncoding::Hex => hex::encode(bytes),
            KeyEncoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
        };

        Ok(StorageKey(format!("{}{}{}", prefix, token, extension)))
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(KeyEncoding::Hex)
    }
}
