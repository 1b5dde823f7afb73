//! BLAKE3 file fingerprints with streaming support.
//!
//! # Overview
//!
//! A [`Fingerprint`] is the 256-bit BLAKE3 digest of a file's content, or of
//! its first `chunk` bytes when prefix hashing is enabled. Files are streamed
//! through a fixed buffer so memory use does not depend on file size.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::HashError;

/// Read buffer size used when streaming file content.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Content fingerprint (BLAKE3-256 digest).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal rendering (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hexadecimal fingerprint.
    ///
    /// Returns `None` if the string has the wrong length or is not hex.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        blake3::Hash::from_hex(s)
            .ok()
            .map(|h| Self(*h.as_bytes()))
    }
}

impl From<blake3::Hash> for Fingerprint {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fingerprint: {s}")))
    }
}

/// Streaming BLAKE3 hasher.
///
/// With a chunk length set, only the first `chunk` bytes of each file are
/// hashed. This trades accuracy for speed on very large files: files that
/// share a prefix but differ later will be reported as duplicates.
///
/// # Example
///
/// ```no_run
/// use dupesweep::scanner::Hasher;
/// use std::path::Path;
///
/// let full = Hasher::new();
/// let prefix = Hasher::new().with_chunk(1024 * 1024);
///
/// let a = full.fingerprint(Path::new("big.iso")).unwrap();
/// let b = prefix.fingerprint(Path::new("big.iso")).unwrap();
/// println!("{a} / {b}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    chunk: Option<u64>,
}

impl Hasher {
    /// Create a hasher that reads whole files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash only the first `chunk` bytes. A chunk of 0 means whole files.
    #[must_use]
    pub fn with_chunk(mut self, chunk: u64) -> Self {
        self.chunk = (chunk > 0).then_some(chunk);
        self
    }

    /// Configured prefix length, if any.
    #[must_use]
    pub fn chunk(&self) -> Option<u64> {
        self.chunk
    }

    /// Compute the fingerprint of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        let result = match self.chunk {
            Some(limit) => hash_reader(file.take(limit)),
            None => hash_reader(file),
        };

        result.map_err(|e| HashError::from_io(path, e))
    }

    /// Compute the fingerprint of in-memory bytes, honoring the chunk length.
    #[must_use]
    pub fn fingerprint_bytes(&self, data: &[u8]) -> Fingerprint {
        let data = match self.chunk {
            Some(limit) if (limit as usize) < data.len() => &data[..limit as usize],
            _ => data,
        };
        blake3::hash(data).into()
    }
}

fn hash_reader<R: Read>(mut reader: R) -> io::Result<Fingerprint> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize().into())
}
