//! Registry API seam

use async_trait::async_trait;
use janitor_core::{ArtifactDetail, Page, Result};

/// Maximum image identifiers per BatchGetImage call
pub const BATCH_GET_IMAGE_LIMIT: usize = 100;

/// Maximum image identifiers per BatchDeleteImage call
pub const BATCH_DELETE_IMAGE_LIMIT: usize = 100;

/// Per-item failure reported by a batch deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub digest: String,
    pub code: String,
    pub reason: String,
}

/// Result of one batch deletion call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Digests actually removed
    pub deleted: Vec<String>,
    pub failures: Vec<DeleteFailure>,
}

/// Container registry (ECR)
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Repository names, optionally restricted to one repository
    async fn list_repositories(
        &self,
        name: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Artifacts of a repository, already classified
    async fn describe_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<Page<ArtifactDetail>>;

    /// Raw manifests of the given tags, at most [`BATCH_GET_IMAGE_LIMIT`]
    ///
    /// Tags that do not resolve are omitted from the result.
    async fn batch_get_manifests(&self, repository: &str, tags: &[String]) -> Result<Vec<String>>;

    /// Delete by digest, at most [`BATCH_DELETE_IMAGE_LIMIT`]
    async fn batch_delete(&self, repository: &str, digests: &[String]) -> Result<DeleteOutcome>;
}
