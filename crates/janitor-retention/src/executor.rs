//! Deletion executor

use crate::planner::DeletionCandidateSet;
use crate::traits::{DeleteFailure, RegistryApi, BATCH_DELETE_IMAGE_LIMIT};
use janitor_core::{CancelToken, Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// What to do with the planned candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Report only
    PlanOnly,
    /// Delete, asking for confirmation unless forced
    Delete { force: bool },
}

/// Interactive confirmation seam
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// What happened to one repository's candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub repository: String,
    pub requested: usize,
    pub deleted: usize,
    pub failures: Vec<DeleteFailure>,
}

impl DeletionReport {
    fn new(candidates: &DeletionCandidateSet) -> Self {
        Self {
            repository: candidates.repository.clone(),
            requested: candidates.len(),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Executor {
    registry: Arc<dyn RegistryApi>,
    confirmer: Arc<dyn Confirmer>,
    mode: ExecutionMode,
    cancel: CancelToken,
}

impl Executor {
    pub fn new(
        registry: Arc<dyn RegistryApi>,
        confirmer: Arc<dyn Confirmer>,
        mode: ExecutionMode,
        cancel: CancelToken,
    ) -> Self {
        Self {
            registry,
            confirmer,
            mode,
            cancel,
        }
    }

    /// Apply every repository's candidates in order
    ///
    /// Stops at the first error (including a declined confirmation).
    pub async fn execute_all(&self, plan: &[DeletionCandidateSet]) -> Result<Vec<DeletionReport>> {
        let mut reports = Vec::with_capacity(plan.len());
        for candidates in plan {
            reports.push(self.execute(candidates).await?);
        }
        Ok(reports)
    }

    pub async fn execute(&self, candidates: &DeletionCandidateSet) -> Result<DeletionReport> {
        let repo = &candidates.repository;
        let mut report = DeletionReport::new(candidates);
        if candidates.is_empty() {
            info!("no need to delete images on {}", repo);
            return Ok(report);
        }

        let force = match self.mode {
            ExecutionMode::PlanOnly => {
                info!(
                    "Expired {} image(s) found on {}. Run delete command to delete them.",
                    candidates.len(),
                    repo
                );
                return Ok(report);
            }
            ExecutionMode::Delete { force } => force,
        };
        if !force {
            let prompt = format!("Do you delete {} images on {}?", candidates.len(), repo);
            if !self.confirmer.confirm(&prompt)? {
                return Err(Error::aborted(repo.as_str()));
            }
        }

        for digest in candidates.digests() {
            info!(action = "delete", "Deleting {} {}", repo, digest);
        }
        // earlier chunks are reported even when a later one failed
        let result = self.delete_chunks(candidates, &mut report).await;
        info!("Deleted {} images on {}", report.deleted, repo);
        for failure in &report.failures {
            warn!(
                "Failed to delete {} {}: {} {}",
                repo, failure.digest, failure.code, failure.reason
            );
        }
        result?;
        Ok(report)
    }

    async fn delete_chunks(
        &self,
        candidates: &DeletionCandidateSet,
        report: &mut DeletionReport,
    ) -> Result<()> {
        for chunk in candidates.digests().chunks(BATCH_DELETE_IMAGE_LIMIT) {
            self.cancel.check()?;
            let outcome = self
                .registry
                .batch_delete(&candidates.repository, chunk)
                .await?;
            report.deleted += outcome.deleted.len();
            report.failures.extend(outcome.failures);
        }
        Ok(())
    }
}
