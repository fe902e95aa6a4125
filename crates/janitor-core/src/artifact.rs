//! Registry artifacts and their classification

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Media types that decide an artifact's class
pub mod media_type {
    pub const DOCKER_CONFIG_JSON: &str = "application/vnd.docker.container.image.v1+json";
    pub const OCI_CONFIG_JSON: &str = "application/vnd.oci.image.config.v1+json";
    pub const OCI_IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
    pub const DOCKER_MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";
    pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
    pub const SOCI_INDEX: &str = "application/vnd.amazon.soci.index.v1+json";
}

/// Resolved kind of a registry artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ArtifactClass {
    /// Runnable image (Docker or OCI config)
    ContainerImage,
    /// Multi-arch manifest list
    ImageIndex,
    /// Side index attached to an image (SOCI)
    AttachedIndex,
    /// Anything else; ignored by the planner
    Unknown,
}

impl ArtifactClass {
    /// Classify from the artifact and manifest media types reported by the registry
    pub fn classify(artifact_media_type: Option<&str>, manifest_media_type: Option<&str>) -> Self {
        let artifact = artifact_media_type.unwrap_or_default();
        match artifact {
            media_type::DOCKER_CONFIG_JSON | media_type::OCI_CONFIG_JSON => Self::ContainerImage,
            media_type::SOCI_INDEX => Self::AttachedIndex,
            "" => match manifest_media_type.unwrap_or_default() {
                media_type::OCI_IMAGE_INDEX | media_type::DOCKER_MANIFEST_LIST => Self::ImageIndex,
                _ => Self::Unknown,
            },
            _ => Self::Unknown,
        }
    }

    /// Label used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::ContainerImage => "Image",
            Self::ImageIndex => "Image index",
            Self::AttachedIndex => "Soci index",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ArtifactClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One artifact stored in a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDetail {
    pub registry_id: String,
    pub repository: String,
    pub digest: String,
    pub tags: Vec<String>,
    pub pushed_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub class: ArtifactClass,
}

impl ArtifactDetail {
    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Display name: `repo:first-tag`, or `repo@digest` when untagged
    pub fn display_name(&self) -> String {
        match self.tags.first() {
            Some(tag) => format!("{}:{}", self.repository, tag),
            None => format!("{}@{}", self.repository, self.digest),
        }
    }

    /// Tag by which dependent indexes reference this artifact (`sha256-<hex>`)
    pub fn cascade_tag(&self) -> String {
        self.digest.replacen("sha256:", "sha256-", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            ArtifactClass::classify(
                Some(media_type::DOCKER_CONFIG_JSON),
                Some(media_type::DOCKER_MANIFEST_V2)
            ),
            ArtifactClass::ContainerImage
        );
        assert_eq!(
            ArtifactClass::classify(Some(media_type::OCI_CONFIG_JSON), None),
            ArtifactClass::ContainerImage
        );
        assert_eq!(
            ArtifactClass::classify(None, Some(media_type::OCI_IMAGE_INDEX)),
            ArtifactClass::ImageIndex
        );
        assert_eq!(
            ArtifactClass::classify(Some(""), Some(media_type::DOCKER_MANIFEST_LIST)),
            ArtifactClass::ImageIndex
        );
        assert_eq!(
            ArtifactClass::classify(Some(media_type::SOCI_INDEX), Some(media_type::OCI_MANIFEST)),
            ArtifactClass::AttachedIndex
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(ArtifactClass::classify(None, None), ArtifactClass::Unknown);
        assert_eq!(
            ArtifactClass::classify(None, Some(media_type::OCI_MANIFEST)),
            ArtifactClass::Unknown
        );
        // an index carrying an artifact type is not a plain manifest list
        assert_eq!(
            ArtifactClass::classify(
                Some("application/vnd.example+json"),
                Some(media_type::OCI_IMAGE_INDEX)
            ),
            ArtifactClass::Unknown
        );
    }

    #[test]
    fn test_cascade_tag() {
        let detail = ArtifactDetail {
            registry_id: "123456789012".into(),
            repository: "app".into(),
            digest: "sha256:aaa".into(),
            tags: vec![],
            pushed_at: Utc::now(),
            size_bytes: 0,
            class: ArtifactClass::ContainerImage,
        };
        assert_eq!(detail.cascade_tag(), "sha256-aaa");
        assert_eq!(detail.display_name(), "app@sha256:aaa");
    }
}
