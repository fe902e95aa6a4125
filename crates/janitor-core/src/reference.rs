//! Container image references
//!
//! An [`ImageReference`] is kept as the exact string seen on the platform
//! (`registry/repository:tag` or `registry/repository@digest`) so that
//! live-set membership is a plain string comparison. Accessors derive the
//! base, tag and digest on demand.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host fragment shared by every private ECR registry endpoint
pub const REGISTRY_HOST_MARKER: &str = ".dkr.ecr.";

/// Container image reference with registry, repository, and tag/digest
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Build the tag-qualified reference of an artifact in a registry
    pub fn tagged(host: &RegistryHost, repository: &str, tag: &str) -> Self {
        Self(format!("{}/{}:{}", host, repository, tag))
    }

    /// Build the digest-qualified reference of an artifact in a registry
    pub fn digested(host: &RegistryHost, repository: &str, digest: &str) -> Self {
        Self(format!("{}/{}@{}", host, repository, digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reference without its tag or digest
    pub fn base(&self) -> &str {
        if let Some(idx) = self.0.find('@') {
            return &self.0[..idx];
        }
        match self.0.rfind(':') {
            // A colon before the last slash belongs to a registry port
            Some(idx) if !self.0[idx..].contains('/') => &self.0[..idx],
            _ => &self.0,
        }
    }

    /// Tag part, empty for digest references and untagged names
    pub fn tag(&self) -> &str {
        if self.is_digest() {
            return "";
        }
        let base = self.base();
        if base.len() == self.0.len() {
            ""
        } else {
            &self.0[base.len() + 1..]
        }
    }

    /// Digest part (`sha256:...`) of a digest reference
    pub fn digest(&self) -> Option<&str> {
        self.0.find('@').map(|idx| &self.0[idx + 1..])
    }

    pub fn is_digest(&self) -> bool {
        self.0.contains('@')
    }

    /// Reference without the registry host
    pub fn short(&self) -> &str {
        self.0.split_once('/').map(|(_, rest)| rest).unwrap_or(&self.0)
    }

    /// Registry host part (everything before the first slash)
    pub fn host(&self) -> &str {
        self.0.split_once('/').map(|(host, _)| host).unwrap_or("")
    }

    /// Whether this reference addresses a private ECR registry
    pub fn is_registry_hosted(&self) -> bool {
        self.host().contains(REGISTRY_HOST_MARKER)
    }

    /// Same repository pinned to a concrete digest
    pub fn with_digest(&self, digest: &str) -> Self {
        Self(format!("{}@{}", self.base(), digest))
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageReference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ImageReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ImageReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Registry endpoint identity: account (registry id) and region
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryHost {
    pub registry_id: String,
    pub region: String,
}

impl RegistryHost {
    pub fn new(registry_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            registry_id: registry_id.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for RegistryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.dkr.ecr.{}.amazonaws.com",
            self.registry_id, self.region
        )
    }
}
