//! OCI image index manifests

use janitor_core::artifact::media_type;
use janitor_core::{Error, Result};
use serde::Deserialize;

/// Entry of an index manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub artifact_type: Option<String>,
}

/// OCI image index (or Docker manifest list)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexManifest {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

impl IndexManifest {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::decode("index manifest", e.to_string()))
    }

    /// Digests of attached (SOCI) indexes referenced by this index
    pub fn attached_index_digests(&self) -> impl Iterator<Item = &str> {
        self.manifests
            .iter()
            .filter(|d| d.artifact_type.as_deref() == Some(media_type::SOCI_INDEX))
            .map(|d| d.digest.as_str())
    }
}
