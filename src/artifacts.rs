//! Persisted artifact blobs for the precomputed model.
//!
//! Each artifact is a bincode-encoded blob (header + payload) behind gzip.
//! The header carries the data format version, a build timestamp, a
//! checksum of the payload bytes, and a build fingerprint shared by every
//! blob written in one save. Blobs whose fingerprints disagree were not
//! produced by the same build and are rejected as a pair at load time, so
//! a rating matrix can never be served against a stale similarity table.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// File name of the persisted rating matrix blob
pub const RATING_MATRIX_FILE: &str = "rating_matrix.bin.gz";
/// File name of the persisted similarity matrix blob
pub const SIMILARITY_FILE: &str = "similarity.bin.gz";
/// File name of the persisted popularity table blob
pub const POPULARITY_FILE: &str = "popularity.bin.gz";

/// Errors raised while persisting or loading artifact blobs
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {file}: {message}")]
    Io { file: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("compression error: {message}")]
    Compression { message: String },

    #[error("data integrity error: checksum mismatch in {file}")]
    ChecksumMismatch { file: String },

    #[error("version compatibility error: expected {expected}, found {found}")]
    VersionIncompatible { expected: String, found: String },

    #[error("artifact pair mismatch: {left} and {right} come from different builds")]
    PairMismatch { left: String, right: String },
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Version information for artifact format compatibility
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataVersion {
    /// Major version (breaking changes)
    pub major: u32,
    /// Minor version (backward compatible features)
    pub minor: u32,
    /// Patch version (bug fixes)
    pub patch: u32,
}

impl DataVersion {
    /// Current artifact format version
    pub const CURRENT: DataVersion = DataVersion {
        major: 1,
        minor: 0,
        patch: 0,
    };

    /// Check whether a blob written at `other` can be read by this version
    pub fn is_compatible(&self, other: &DataVersion) -> bool {
        self.major == other.major && self.minor >= other.minor
    }

    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for DataVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Metadata written ahead of every artifact payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Artifact format version
    pub version: DataVersion,
    /// When the build that produced this blob ran
    pub built_at: DateTime<Utc>,
    /// SHA-256 fingerprint of the build; identical across a saved set
    pub build_fingerprint: String,
    /// SHA-256 checksum of the serialized payload bytes
    pub payload_checksum: String,
}

impl ArtifactHeader {
    /// Validate that this blob can be read by the current format version
    pub fn validate_compatibility(&self) -> ArtifactResult<()> {
        if !DataVersion::CURRENT.is_compatible(&self.version) {
            return Err(ArtifactError::VersionIncompatible {
                expected: DataVersion::CURRENT.version_string(),
                found: self.version.version_string(),
            });
        }
        Ok(())
    }
}

/// On-disk layout of one artifact blob
#[derive(Serialize, Deserialize)]
struct ArtifactBlob {
    header: ArtifactHeader,
    /// bincode-encoded payload
    payload: Vec<u8>,
}

/// Compute the hex SHA-256 digest of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Serialize, compress, and write one artifact blob
pub fn write_blob<T: Serialize>(
    path: &Path,
    payload: &T,
    build_fingerprint: &str,
    built_at: DateTime<Utc>,
) -> ArtifactResult<()> {
    let payload_bytes = bincode::serialize(payload)?;

    let blob = ArtifactBlob {
        header: ArtifactHeader {
            version: DataVersion::CURRENT,
            built_at,
            build_fingerprint: build_fingerprint.to_string(),
            payload_checksum: sha256_hex(&payload_bytes),
        },
        payload: payload_bytes,
    };

    let serialized = bincode::serialize(&blob)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&serialized)
        .map_err(|e| ArtifactError::Compression {
            message: format!("Gzip compression failed: {}", e),
        })?;
    let compressed = encoder.finish().map_err(|e| ArtifactError::Compression {
        message: format!("Gzip compression failed: {}", e),
    })?;

    fs::write(path, &compressed).map_err(|e| ArtifactError::Io {
        file: path.display().to_string(),
        message: format!("Failed to write artifact file: {}", e),
    })?;

    log::debug!(
        "📦 Wrote artifact {} ({} bytes compressed)",
        path.display(),
        compressed.len()
    );

    Ok(())
}

/// Read, decompress, verify, and deserialize one artifact blob
pub fn read_blob<T: DeserializeOwned>(path: &Path) -> ArtifactResult<(ArtifactHeader, T)> {
    let compressed = fs::read(path).map_err(|e| ArtifactError::Io {
        file: path.display().to_string(),
        message: format!("Failed to read artifact file: {}", e),
    })?;

    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut serialized = Vec::new();
    decoder
        .read_to_end(&mut serialized)
        .map_err(|e| ArtifactError::Compression {
            message: format!("Gzip decompression failed: {}", e),
        })?;

    let blob: ArtifactBlob = bincode::deserialize(&serialized)?;
    blob.header.validate_compatibility()?;

    if sha256_hex(&blob.payload) != blob.header.payload_checksum {
        return Err(ArtifactError::ChecksumMismatch {
            file: path.display().to_string(),
        });
    }

    let payload = bincode::deserialize(&blob.payload)?;
    Ok((blob.header, payload))
}

/// Reject blobs whose build fingerprints disagree
pub fn verify_paired(headers: &[(&str, &ArtifactHeader)]) -> ArtifactResult<()> {
    for pair in headers.windows(2) {
        let (left_name, left) = pair[0];
        let (right_name, right) = pair[1];
        if left.build_fingerprint != right.build_fingerprint {
            return Err(ArtifactError::PairMismatch {
                left: left_name.to_string(),
                right: right_name.to_string(),
            });
        }
    }
    Ok(())
}
