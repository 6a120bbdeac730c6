//! Core types shared by the state model and the store manager.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since Unix epoch.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    ///
    /// A clock set before the epoch reads as zero.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_millis() as i64)
    }
}

impl Timestamp {
    /// Parse an RFC 3339 / ISO 8601 date such as `2024-01-01T00:00:00.000Z`.
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Timestamp(dt.timestamp_millis()))
    }

    /// Deserialize epoch milliseconds or an ISO date string.
    ///
    /// Older documents stamped `savedAt` as an ISO string. A string that does
    /// not parse, or null, reads as zero.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(i64),
            Text(String),
            Null(()),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Timestamp(ms),
            Raw::Text(s) => Timestamp::parse_rfc3339(&s).unwrap_or_else(|| {
                tracing::warn!(value = %s, "unreadable timestamp");
                Timestamp::default()
            }),
            Raw::Null(()) => Timestamp::default(),
        })
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layout record written after every successful save.
///
/// `chunks == 1` means the payload sits unsplit under the main key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMeta {
    /// Schema version of the writer.
    pub version: String,

    /// Number of physical values holding the payload.
    pub chunks: usize,

    /// When the save completed.
    pub saved_at: Timestamp,

    /// CRC-32 of the encoded payload. Older writers did not record one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
}

impl SaveMeta {
    pub fn new(version: impl Into<String>, chunks: usize, payload: &str) -> Self {
        Self {
            version: version.into(),
            chunks,
            saved_at: Timestamp::now(),
            checksum: Some(crc32fast::hash(payload.as_bytes())),
        }
    }

    /// Whether the payload is split across chunk keys.
    pub fn is_chunked(&self) -> bool {
        self.chunks > 1
    }
}

/// Summary of a completed save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReport {
    /// Number of values written for the payload (1 for the main key).
    pub chunks: usize,
    /// Encoded payload size in bytes.
    pub bytes: usize,
    /// Timestamp recorded in the metadata.
    pub saved_at: Timestamp,
}

/// Check that a version string is shaped `major.minor.patch`.
pub fn is_semver_shaped(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
