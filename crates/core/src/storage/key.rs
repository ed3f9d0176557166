use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::StorageError;

/// Storage key of the form `jobs/{job_id}/{stage}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Builds the deterministic key for an artifact produced by `stage`.
    pub fn for_stage(job_id: &str, stage: &str, name: &str) -> Self {
        Self(format!(
            "jobs/{}/{}/{}",
            job_id,
            stage.to_lowercase(),
            name
        ))
    }

    /// Parses and validates a key previously produced by [`for_stage`](Self::for_stage).
    pub fn parse(key: &str) -> Result<Self, StorageError> {
        let parts: Vec<&str> = key.split('/').collect();
        let valid = parts.len() == 4
            && parts[0] == "jobs"
            && parts[1..]
                .iter()
                .all(|p| !p.is_empty() && *p != "." && *p != ".." && !p.contains('\\'));
        if valid {
            Ok(Self(key.to_string()))
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Job id component.
    pub fn job_id(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or_default()
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArtifactKey {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArtifactKey> for String {
    fn from(key: ArtifactKey) -> Self {
        key.0
    }
}
