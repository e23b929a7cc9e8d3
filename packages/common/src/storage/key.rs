use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::error::StorageError;

/// An opaque write-once handle for a stored blob.
///
/// Keys are minted server-side before upload and rendered as 32 lowercase
/// hex characters. The key carries no information about the blob contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobKey(Uuid);

impl BlobKey {
    /// Mint a fresh random key.
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the first 2 hex characters (shard prefix for filesystem layout).
    pub fn shard_prefix(&self) -> String {
        self.0.as_simple().to_string()[..2].to_string()
    }

    /// Return the remaining 30 hex characters (filename within shard).
    pub fn shard_suffix(&self) -> String {
        self.0.as_simple().to_string()[2..].to_string()
    }
}

impl FromStr for BlobKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidKey(format!(
                "expected 32 hex characters, got {:?}",
                s.chars().take(40).collect::<String>()
            )));
        }
        let uuid = Uuid::try_parse(s)
            .map_err(|e| StorageError::InvalidKey(format!("invalid key: {e}")))?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0.as_simple())
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

impl serde::Serialize for BlobKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for BlobKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
