//! ECS cluster and task definition family scanners

use crate::traits::{EcsApi, TaskDescription, TaskStatus};
use crate::util::{collect_pages, for_each_bounded};
use janitor_core::arn::{cluster_arn_to_name, Arn, TaskDefinitionRef};
use janitor_core::config::{ClusterPolicy, TaskDefinitionPolicy};
use janitor_core::{CancelToken, ImageReference, LiveImageTable, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum tasks per DescribeTasks call
pub const DESCRIBE_TASKS_LIMIT: usize = 100;

/// Maximum services per DescribeServices call
pub const DESCRIBE_SERVICES_LIMIT: usize = 10;

/// Finds images used by ECS tasks, services, and recent task definitions
pub struct EcsScanner {
    api: Arc<dyn EcsApi>,
    cancel: CancelToken,
    max_concurrency: usize,
}

impl EcsScanner {
    pub fn new(api: Arc<dyn EcsApi>, cancel: CancelToken, max_concurrency: usize) -> Self {
        Self {
            api,
            cancel,
            max_concurrency,
        }
    }

    /// Scan matched clusters and task definition families
    ///
    /// Images pinned to a pulled digest on running containers are recorded
    /// in digest form; every image declared by a task definition in use
    /// (or among the newest revisions of a matched family) is recorded as
    /// declared.
    pub async fn scan(
        &self,
        clusters: &[ClusterPolicy],
        families: &[TaskDefinitionPolicy],
    ) -> Result<LiveImageTable> {
        let mut live = LiveImageTable::new();
        let mut task_definitions = BTreeSet::new();

        if !clusters.is_empty() {
            let (cluster_live, in_use) = self.scan_clusters(clusters).await?;
            live.merge(cluster_live);
            task_definitions.extend(in_use);
        }
        if !families.is_empty() {
            task_definitions.extend(self.scan_families(families).await?);
        }

        live.merge(self.task_definition_images(task_definitions).await?);
        Ok(live)
    }

    async fn scan_clusters(
        &self,
        policies: &[ClusterPolicy],
    ) -> Result<(LiveImageTable, BTreeSet<TaskDefinitionRef>)> {
        let api = self.api.as_ref();
        let cluster_arns = collect_pages(&self.cancel, |t| api.list_clusters(t)).await?;
        let matched: Vec<String> = cluster_arns
            .into_iter()
            .filter(|arn| policies.iter().any(|p| p.matches(arn)))
            .collect();

        let results = for_each_bounded(matched, self.max_concurrency, |cluster_arn| async move {
            self.scan_cluster(&cluster_arn).await
        })
        .await?;

        let mut live = LiveImageTable::new();
        let mut in_use = BTreeSet::new();
        for (cluster_live, cluster_in_use) in results {
            live.merge(cluster_live);
            in_use.extend(cluster_in_use);
        }
        Ok((live, in_use))
    }

    /// Task definitions and pulled digests in use on one cluster
    async fn scan_cluster(
        &self,
        cluster_arn: &str,
    ) -> Result<(LiveImageTable, BTreeSet<TaskDefinitionRef>)> {
        let api = self.api.as_ref();
        let cluster_name = cluster_arn_to_name(cluster_arn);
        let mut live = LiveImageTable::new();
        let mut in_use = BTreeSet::new();

        debug!("Checking tasks in {}", cluster_arn);
        let mut task_arns = Vec::new();
        // stopped tasks keep the previous deployment around for rollback
        for status in [TaskStatus::Running, TaskStatus::Stopped] {
            task_arns.extend(
                collect_pages(&self.cancel, |t| api.list_tasks(cluster_arn, status, t)).await?,
            );
        }

        for chunk in task_arns.chunks(DESCRIBE_TASKS_LIMIT) {
            self.cancel.check()?;
            for task in api.describe_tasks(cluster_arn, chunk).await? {
                let td = TaskDefinitionRef::from_arn(&task.task_definition_arn)?;
                let task_id = task_resource(&task);
                if in_use.insert(td.clone()) {
                    info!("Task definition {} is used by {}", td, task_id);
                }
                record_task_images(&mut live, &task, &td, &task_id);
            }
        }

        let service_arns = collect_pages(&self.cancel, |t| api.list_services(cluster_arn, t)).await?;
        for chunk in service_arns.chunks(DESCRIBE_SERVICES_LIMIT) {
            self.cancel.check()?;
            for service in api.describe_services(cluster_arn, chunk).await? {
                debug!("Checking service {}", service.service_name);
                for deployment in &service.deployments {
                    let td = TaskDefinitionRef::from_arn(&deployment.task_definition_arn)?;
                    if in_use.insert(td.clone()) {
                        info!(
                            "Task definition {} is used by {} deployment on service {}/{}",
                            td, deployment.status, service.service_name, cluster_name
                        );
                    }
                }
            }
        }

        Ok((live, in_use))
    }

    /// Newest revisions of every matched family
    async fn scan_families(
        &self,
        policies: &[TaskDefinitionPolicy],
    ) -> Result<BTreeSet<TaskDefinitionRef>> {
        let api = self.api.as_ref();
        let families = collect_pages(&self.cancel, |t| api.list_task_definition_families(t)).await?;
        debug!("Task definition families: {:?}", families);

        let mut revisions = BTreeSet::new();
        for family in families {
            let Some(policy) = policies.iter().find(|p| p.matches(&family)) else {
                continue;
            };
            let keep = usize::try_from(policy.keep_count).unwrap_or(usize::MAX);
            debug!(
                "Checking task definitions {} latest {} revisions",
                family, policy.keep_count
            );

            let mut arns = Vec::new();
            let mut token = None;
            // newest first; stop paging once enough revisions are seen
            while arns.len() < keep {
                self.cancel.check()?;
                let page = api.list_task_definitions(&family, token.take()).await?;
                arns.extend(page.items);
                match page.next_token {
                    Some(next) => token = Some(next),
                    None => break,
                }
            }
            for arn in arns.iter().take(keep) {
                revisions.insert(TaskDefinitionRef::from_arn(arn)?);
            }
        }
        Ok(revisions)
    }

    /// Registry-hosted images declared by each task definition
    async fn task_definition_images(
        &self,
        task_definitions: BTreeSet<TaskDefinitionRef>,
    ) -> Result<LiveImageTable> {
        let api = self.api.as_ref();
        let cancel = &self.cancel;
        let results = for_each_bounded(task_definitions, self.max_concurrency, |td| async move {
            cancel.check()?;
            let label = td.to_string();
            let images = api.task_definition_images(&label).await?;
            Ok((label, images))
        })
        .await?;

        let mut live = LiveImageTable::new();
        for (label, images) in results {
            for image in images {
                let reference = ImageReference::new(image);
                if !reference.is_registry_hosted() {
                    debug!("Skipping non-registry image {}", reference);
                    continue;
                }
                if live.add(reference.clone(), label.clone()) {
                    info!("Image {} is in use by task definition {}", reference, label);
                }
            }
        }
        Ok(live)
    }
}

/// Record digests the runtime actually pulled for a task's containers
fn record_task_images(
    live: &mut LiveImageTable,
    task: &TaskDescription,
    td: &TaskDefinitionRef,
    task_id: &str,
) {
    for container in &task.containers {
        let Some(image) = container.image.as_deref() else {
            continue;
        };
        let declared = ImageReference::from(image);
        if !declared.is_registry_hosted() {
            continue;
        }
        let pinned = if declared.is_digest() {
            declared
        } else if let Some(digest) = container.image_digest.as_deref() {
            declared.with_digest(digest)
        } else {
            continue;
        };
        if live.add(pinned.clone(), td.to_string()) {
            info!(
                "Image {} is used by {} container on {}",
                pinned, container.name, task_id
            );
        }
    }
}

fn task_resource(task: &TaskDescription) -> String {
    Arn::parse(&task.task_arn)
        .map(|arn| arn.resource)
        .unwrap_or_else(|_| task.task_arn.clone())
}
