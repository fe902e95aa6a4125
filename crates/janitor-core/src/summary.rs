//! Per-repository retention statistics

use crate::artifact::{ArtifactClass, ArtifactDetail};
use serde::Serialize;
use tracing::warn;

/// Seen vs. expired statistics for one artifact class of one repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub repository: String,
    #[serde(rename = "type")]
    pub class: String,
    pub total_images: u64,
    pub total_image_size: u64,
    pub expired_images: u64,
    pub expired_image_size: u64,
}

impl ClassSummary {
    fn new(repository: &str, class: ArtifactClass) -> Self {
        Self {
            repository: repository.to_string(),
            class: class.label().to_string(),
            ..Default::default()
        }
    }

    pub fn kept_images(&self) -> u64 {
        self.total_images.saturating_sub(self.expired_images)
    }

    pub fn kept_image_size(&self) -> u64 {
        self.total_image_size.saturating_sub(self.expired_image_size)
    }

    /// Plain images are always shown; index rows only when the repository has any
    pub fn is_printable(&self) -> bool {
        self.class == ArtifactClass::ContainerImage.label() || self.total_images > 0
    }
}

/// Statistics of one repository, one row per tracked class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    pub repository: String,
    pub images: ClassSummary,
    pub image_indexes: ClassSummary,
    pub attached_indexes: ClassSummary,
}

impl RepositorySummary {
    pub fn new(repository: impl Into<String>) -> Self {
        let repository = repository.into();
        Self {
            images: ClassSummary::new(&repository, ArtifactClass::ContainerImage),
            image_indexes: ClassSummary::new(&repository, ArtifactClass::ImageIndex),
            attached_indexes: ClassSummary::new(&repository, ArtifactClass::AttachedIndex),
            repository,
        }
    }

    fn row_mut(&mut self, detail: &ArtifactDetail) -> Option<&mut ClassSummary> {
        match detail.class {
            ArtifactClass::ContainerImage => Some(&mut self.images),
            ArtifactClass::ImageIndex => Some(&mut self.image_indexes),
            ArtifactClass::AttachedIndex => Some(&mut self.attached_indexes),
            ArtifactClass::Unknown => {
                warn!(
                    repository = %detail.repository,
                    digest = %detail.digest,
                    "Unknown artifact type, not counted"
                );
                None
            }
        }
    }

    /// Count an artifact as seen
    pub fn add(&mut self, detail: &ArtifactDetail) {
        if let Some(row) = self.row_mut(detail) {
            row.total_images += 1;
            row.total_image_size += detail.size_bytes;
        }
    }

    /// Count an artifact as expired
    pub fn expire(&mut self, detail: &ArtifactDetail) {
        if let Some(row) = self.row_mut(detail) {
            row.expired_images += 1;
            row.expired_image_size += detail.size_bytes;
        }
    }

    pub fn rows(&self) -> [&ClassSummary; 3] {
        [&self.images, &self.image_indexes, &self.attached_indexes]
    }
}

/// Summary rows of a whole run
#[derive(Debug, Clone, Default)]
pub struct SummaryTable {
    repositories: Vec<RepositorySummary>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, summary: RepositorySummary) {
        self.repositories.push(summary);
    }

    /// Order repositories by name
    pub fn sort(&mut self) {
        self.repositories
            .sort_by(|a, b| a.repository.cmp(&b.repository));
    }

    pub fn repositories(&self) -> &[RepositorySummary] {
        &self.repositories
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Rows worth showing, in repository order
    pub fn printable_rows(&self) -> Vec<&ClassSummary> {
        self.repositories
            .iter()
            .flat_map(|r| r.rows())
            .filter(|row| row.is_printable())
            .collect()
    }
}
