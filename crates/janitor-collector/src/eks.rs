//! EKS workload scanner
//!
//! Walks pods (actual pulled digests) and the pod templates of
//! ReplicaSets, ControllerRevisions and CronJobs (what a rollback or the
//! next schedule would pull).

use crate::traits::{EksApi, KubeApi};
use crate::util::{collect_pages, for_each_bounded};
use janitor_core::config::EksClusterPolicy;
use janitor_core::{CancelToken, Error, ImageReference, LiveImageTable, Result};
use k8s_openapi::api::apps::v1::ControllerRevision;
use k8s_openapi::api::core::v1::{Container, ContainerStatus, Pod, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DOCKER_PULLABLE_PREFIX: &str = "docker-pullable://";

/// Workload kinds whose ControllerRevisions embed a pod template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionOwner {
    StatefulSet,
    DaemonSet,
}

impl RevisionOwner {
    fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "StatefulSet" => Some(Self::StatefulSet),
            "DaemonSet" => Some(Self::DaemonSet),
            _ => None,
        }
    }
}

/// Finds images used by workloads on matched EKS clusters
pub struct EksScanner {
    api: Arc<dyn EksApi>,
    cancel: CancelToken,
    max_concurrency: usize,
}

impl EksScanner {
    pub fn new(api: Arc<dyn EksApi>, cancel: CancelToken, max_concurrency: usize) -> Self {
        Self {
            api,
            cancel,
            max_concurrency,
        }
    }

    pub async fn scan(&self, policies: &[EksClusterPolicy]) -> Result<LiveImageTable> {
        if policies.is_empty() {
            debug!("No EKS clusters configured, skipping EKS scan");
            return Ok(LiveImageTable::new());
        }
        let api = self.api.as_ref();
        let clusters = collect_pages(&self.cancel, |t| api.list_clusters(t)).await?;
        let matched: Vec<String> = clusters
            .into_iter()
            .filter(|name| policies.iter().any(|p| p.matches(name)))
            .collect();

        let tables = for_each_bounded(matched, self.max_concurrency, |cluster| async move {
            debug!("Scanning EKS cluster {}", cluster);
            self.cancel.check()?;
            let kube = self.api.connect(&cluster).await?;
            ClusterScan::new(&cluster, kube, &self.cancel).run().await
        })
        .await?;

        let mut live = LiveImageTable::new();
        for table in tables {
            live.merge(table);
        }
        Ok(live)
    }
}

/// Scan of a single cluster
pub struct ClusterScan<'a> {
    cluster: &'a str,
    kube: Arc<dyn KubeApi>,
    cancel: &'a CancelToken,
    live: LiveImageTable,
}

impl<'a> ClusterScan<'a> {
    pub fn new(cluster: &'a str, kube: Arc<dyn KubeApi>, cancel: &'a CancelToken) -> Self {
        Self {
            cluster,
            kube,
            cancel,
            live: LiveImageTable::new(),
        }
    }

    pub async fn run(mut self) -> Result<LiveImageTable> {
        self.scan_pods().await?;
        self.scan_replica_sets().await?;
        self.scan_controller_revisions().await?;
        self.scan_cron_jobs().await?;
        Ok(self.live)
    }

    fn label(&self, kind: &str, meta: &ObjectMeta) -> String {
        format!(
            "{}/{}/{}/{}",
            self.cluster,
            kind,
            meta.namespace.as_deref().unwrap_or_default(),
            meta.name.as_deref().unwrap_or_default()
        )
    }

    async fn scan_pods(&mut self) -> Result<()> {
        let kube = self.kube.clone();
        let pods = collect_pages(self.cancel, |t| kube.list_pods(t)).await?;
        debug!("EKS cluster {}: {} pods", self.cluster, pods.len());

        for pod in &pods {
            let consumer = self.label("pod", &pod.metadata);
            for (status, role) in pod_container_statuses(pod) {
                let Some(normalized) = normalize_pod_image(&status.image_id, &status.image) else {
                    continue;
                };
                let reference = ImageReference::new(normalized);
                if !reference.is_registry_hosted() {
                    continue;
                }
                if self.live.add(reference.clone(), consumer.clone()) {
                    info!(
                        "Image {} is used by {} ({}={})",
                        reference, consumer, role, status.name
                    );
                }
            }
        }
        Ok(())
    }

    async fn scan_replica_sets(&mut self) -> Result<()> {
        let kube = self.kube.clone();
        let replica_sets = collect_pages(self.cancel, |t| kube.list_replica_sets(t)).await?;
        debug!(
            "EKS cluster {}: found {} replicasets",
            self.cluster,
            replica_sets.len()
        );
        for rs in &replica_sets {
            let consumer = self.label("replicaset", &rs.metadata);
            if let Some(template) = rs.spec.as_ref().and_then(|s| s.template.as_ref()) {
                self.record_template(template, &consumer);
            }
        }
        Ok(())
    }

    async fn scan_controller_revisions(&mut self) -> Result<()> {
        let kube = self.kube.clone();
        let revisions = collect_pages(self.cancel, |t| kube.list_controller_revisions(t)).await?;
        debug!(
            "EKS cluster {}: found {} controllerrevisions",
            self.cluster,
            revisions.len()
        );
        for rev in &revisions {
            let consumer = self.label("controllerrevision", &rev.metadata);
            match revision_template(rev) {
                Ok(template) => self.record_template(&template, &consumer),
                Err(e) if e.is_recoverable() => {
                    warn!("Failed to extract images from {}: {}", consumer, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn scan_cron_jobs(&mut self) -> Result<()> {
        let kube = self.kube.clone();
        let cron_jobs = collect_pages(self.cancel, |t| kube.list_cron_jobs(t)).await?;
        debug!(
            "EKS cluster {}: found {} cronjobs",
            self.cluster,
            cron_jobs.len()
        );
        for cron_job in &cron_jobs {
            let consumer = self.label("cronjob", &cron_job.metadata);
            let template = cron_job
                .spec
                .as_ref()
                .and_then(|s| s.job_template.spec.as_ref())
                .map(|job| &job.template);
            if let Some(template) = template {
                self.record_template(template, &consumer);
            }
        }
        Ok(())
    }

    fn record_template(&mut self, template: &PodTemplateSpec, consumer: &str) {
        for (container, role) in template_containers(template) {
            let Some(image) = container.image.as_deref() else {
                continue;
            };
            let reference = ImageReference::from(image);
            if !reference.is_registry_hosted() {
                continue;
            }
            if self.live.add(reference.clone(), consumer) {
                info!(
                    "Image {} is used by {} ({}={})",
                    reference, consumer, role, container.name
                );
            }
        }
    }
}

fn pod_container_statuses(pod: &Pod) -> impl Iterator<Item = (&ContainerStatus, &'static str)> {
    let status = pod.status.as_ref();
    let containers = status
        .and_then(|s| s.container_statuses.as_ref())
        .into_iter()
        .flatten()
        .map(|c| (c, "container"));
    let init_containers = status
        .and_then(|s| s.init_container_statuses.as_ref())
        .into_iter()
        .flatten()
        .map(|c| (c, "initContainer"));
    containers.chain(init_containers)
}

fn template_containers(
    template: &PodTemplateSpec,
) -> impl Iterator<Item = (&Container, &'static str)> {
    let spec = template.spec.as_ref();
    let containers = spec
        .map(|s| &s.containers)
        .into_iter()
        .flatten()
        .map(|c| (c, "container"));
    let init_containers = spec
        .and_then(|s| s.init_containers.as_ref())
        .into_iter()
        .flatten()
        .map(|c| (c, "initContainer"));
    containers.chain(init_containers)
}

/// Pod template embedded in a StatefulSet or DaemonSet ControllerRevision
///
/// Missing data, unknown owner kinds and undecodable payloads are
/// [`Error::Decode`].
pub fn revision_template(rev: &ControllerRevision) -> Result<PodTemplateSpec> {
    let subject = format!(
        "ControllerRevision {}/{}",
        rev.metadata.namespace.as_deref().unwrap_or_default(),
        rev.metadata.name.as_deref().unwrap_or_default()
    );
    let data = rev
        .data
        .as_ref()
        .map(|raw| &raw.0)
        .ok_or_else(|| Error::decode(&subject, "no data in ControllerRevision"))?;

    let owner = rev
        .metadata
        .owner_references
        .iter()
        .flatten()
        .find_map(|o| RevisionOwner::from_kind(&o.kind))
        .ok_or_else(|| Error::decode(&subject, "unknown owner type for ControllerRevision"))?;

    // both controllers store a patch of the owner's `spec.template`
    let template = match owner {
        RevisionOwner::StatefulSet | RevisionOwner::DaemonSet => data.pointer("/spec/template"),
    }
    .ok_or_else(|| Error::decode(&subject, format!("{:?} data has no spec.template", owner)))?;

    serde_json::from_value(template.clone())
        .map_err(|e| Error::decode(&subject, format!("failed to decode {:?} data: {}", owner, e)))
}

/// Canonical `base@digest` form of a pod's runtime image id
///
/// Runtimes report either `docker-pullable://repo@sha256:...`, a full
/// `repo@sha256:...`, or a bare `sha256:...` which is joined with the
/// image name's base.
pub fn normalize_pod_image(image_id: &str, image: &str) -> Option<String> {
    if image_id.is_empty() {
        return None;
    }
    let cleaned = image_id
        .strip_prefix(DOCKER_PULLABLE_PREFIX)
        .unwrap_or(image_id);
    if cleaned.contains("@sha256:") {
        return Some(cleaned.to_string());
    }
    if cleaned.starts_with("sha256:") && !image.is_empty() {
        return Some(ImageReference::from(image).with_digest(cleaned).to_string());
    }
    None
}
