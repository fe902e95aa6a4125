//! Retention planner
//!
//! Lists repositories, applies the first matching policy to each and
//! produces deletion candidates plus summary statistics. Nothing is
//! deleted here.

use crate::phases::{
    attached_index_digests, attached_index_phase, container_image_phase, image_index_phase,
    Inventory, RetentionContext,
};
use crate::traits::RegistryApi;
use janitor_core::{
    collect_pages, CancelToken, LiveImageTable, RepositoryPolicy, RepositorySummary, Result,
    SummaryTable,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Digests of one repository slated for deletion, in decision order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionCandidateSet {
    pub repository: String,
    digests: Vec<String>,
}

impl DeletionCandidateSet {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            digests: Vec::new(),
        }
    }

    pub fn push(&mut self, digest: impl Into<String>) {
        self.digests.push(digest.into());
    }

    pub fn digests(&self) -> &[String] {
        &self.digests
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.digests.iter().any(|d| d == digest)
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

/// Outcome of planning every matched repository
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub summary: SummaryTable,
    /// One entry per planned repository, ordered by name
    pub candidates: Vec<DeletionCandidateSet>,
}

impl Plan {
    pub fn total_candidates(&self) -> usize {
        self.candidates.iter().map(DeletionCandidateSet::len).sum()
    }

    pub fn repository(&self, name: &str) -> Option<&DeletionCandidateSet> {
        self.candidates.iter().find(|c| c.repository == name)
    }
}

pub struct Planner {
    registry: Arc<dyn RegistryApi>,
    region: String,
    cancel: CancelToken,
}

impl Planner {
    pub fn new(registry: Arc<dyn RegistryApi>, region: impl Into<String>, cancel: CancelToken) -> Self {
        Self {
            registry,
            region: region.into(),
            cancel,
        }
    }

    /// Plan every repository matched by a policy
    ///
    /// With `repository` set only that repository is listed. Repositories
    /// matching no policy are skipped.
    pub async fn plan(
        &self,
        policies: &[RepositoryPolicy],
        live: &LiveImageTable,
        repository: Option<&str>,
    ) -> Result<Plan> {
        info!("Finding expired images");
        let registry = self.registry.as_ref();
        let names = collect_pages(&self.cancel, |t| registry.list_repositories(repository, t)).await?;

        let mut plan = Plan::default();
        for name in names {
            let Some(policy) = RepositoryPolicy::first_match(policies, &name) else {
                debug!("No policy matches repository {}, skipping", name);
                continue;
            };
            let (summary, candidates) = self.plan_repository(&name, policy, live).await?;
            plan.summary.push(summary);
            plan.candidates.push(candidates);
        }
        plan.summary.sort();
        plan.candidates
            .sort_by(|a, b| a.repository.cmp(&b.repository));
        Ok(plan)
    }

    /// Run the three phases against one repository
    pub async fn plan_repository(
        &self,
        repository: &str,
        policy: &RepositoryPolicy,
        live: &LiveImageTable,
    ) -> Result<(RepositorySummary, DeletionCandidateSet)> {
        let registry = self.registry.as_ref();
        let artifacts =
            collect_pages(&self.cancel, |t| registry.describe_images(repository, t)).await?;
        let inventory = Inventory::new(repository, artifacts);
        info!(
            "{} has {} images, {} image indexes, {} attached indexes",
            repository,
            inventory.images.len(),
            inventory.image_indexes.len(),
            inventory.attached_indexes.len()
        );

        let ctx = RetentionContext {
            policy,
            live,
            region: &self.region,
        };
        let mut summary = RepositorySummary::new(repository);
        let mut candidates = DeletionCandidateSet::new(repository);

        let images = container_image_phase(&inventory, &ctx);
        let indexes = image_index_phase(&inventory, &images.cascade_keys);
        let attached_digests =
            attached_index_digests(registry, repository, &images.cascade_keys, &self.cancel)
                .await?;
        let attached = attached_index_phase(&inventory, &attached_digests);

        for detail in inventory
            .images
            .iter()
            .chain(&inventory.image_indexes)
            .chain(&inventory.attached_indexes)
        {
            summary.add(detail);
        }
        for detail in images.expired().chain(indexes).chain(attached) {
            summary.expire(detail);
            candidates.push(detail.digest.as_str());
        }

        Ok((summary, candidates))
    }
}
