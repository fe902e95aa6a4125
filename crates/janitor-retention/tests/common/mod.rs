//! In-memory registry and confirmation fakes

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use janitor_core::config::RepositoryFile;
use janitor_core::{
    ArtifactClass, ArtifactDetail, Error, ImageReference, LiveImageTable, Page, RegistryHost,
    RepositoryPolicy, Result,
};
use janitor_retention::{Confirmer, DeleteFailure, DeleteOutcome, RegistryApi};
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;

pub const REGISTRY_ID: &str = "123456789012";
pub const REGION: &str = "us-east-1";
pub const PAGE_SIZE: usize = 2;

pub fn host() -> RegistryHost {
    RegistryHost::new(REGISTRY_ID, REGION)
}

pub fn artifact(
    repository: &str,
    digest: &str,
    tags: &[&str],
    age_days: i64,
    class: ArtifactClass,
) -> ArtifactDetail {
    ArtifactDetail {
        registry_id: REGISTRY_ID.to_string(),
        repository: repository.to_string(),
        digest: digest.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        pushed_at: Utc::now() - Duration::days(age_days),
        size_bytes: 1_000,
        class,
    }
}

pub fn image(repository: &str, digest: &str, tags: &[&str], age_days: i64) -> ArtifactDetail {
    artifact(repository, digest, tags, age_days, ArtifactClass::ContainerImage)
}

pub fn policy(name: &str, expires: &str, keep_count: u64, keep_tags: &[&str]) -> RepositoryPolicy {
    RepositoryPolicy::from_file(
        &RepositoryFile {
            name_pattern: Some(name.to_string()),
            expires: Some(expires.to_string()),
            keep_count,
            keep_tag_patterns: keep_tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        },
        Utc::now(),
    )
    .unwrap()
}

/// Live table holding tag-qualified references of `repository`
pub fn live_tags(repository: &str, tags: &[&str]) -> LiveImageTable {
    let mut live = LiveImageTable::new();
    for tag in tags {
        live.add(ImageReference::tagged(&host(), repository, tag), "test");
    }
    live
}

/// Index manifest listing an image and a SOCI index
pub fn index_manifest(image_digest: &str, soci_digest: &str) -> String {
    serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.index.v1+json",
        "manifests": [
            {
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "digest": image_digest,
                "size": 100
            },
            {
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "artifactType": "application/vnd.amazon.soci.index.v1+json",
                "digest": soci_digest,
                "size": 100
            }
        ]
    })
    .to_string()
}

fn page<T: Clone>(items: &[T], token: Option<String>) -> Page<T> {
    let start: usize = token.and_then(|t| t.parse().ok()).unwrap_or(0);
    let end = (start + PAGE_SIZE).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Page::new(items[start.min(end)..end].to_vec(), next)
}

#[derive(Default)]
pub struct FakeRegistry {
    pub repositories: Vec<String>,
    pub artifacts: HashMap<String, Vec<ArtifactDetail>>,
    /// (repository, tag) → raw manifest
    pub manifests: HashMap<(String, String), String>,
    /// Digests the provider refuses to delete
    pub undeletable: HashSet<String>,
    /// Number of BatchDeleteImage calls that succeed before the rest fail
    pub fail_deletes_after: Option<usize>,
    pub calls: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn with_repository(mut self, name: &str, artifacts: Vec<ArtifactDetail>) -> Self {
        self.repositories.push(name.to_string());
        self.artifacts.insert(name.to_string(), artifacts);
        self
    }

    pub fn with_manifest(mut self, repository: &str, tag: &str, manifest: String) -> Self {
        self.manifests
            .insert((repository.to_string(), tag.to_string()), manifest);
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn list_repositories(
        &self,
        name: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.record(format!("DescribeRepositories {:?}", name));
        let names: Vec<String> = self
            .repositories
            .iter()
            .filter(|r| name.is_none_or(|n| n == r.as_str()))
            .cloned()
            .collect();
        Ok(page(&names, next_token))
    }

    async fn describe_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<Page<ArtifactDetail>> {
        self.record(format!("DescribeImages {}", repository));
        let artifacts = self.artifacts.get(repository).cloned().unwrap_or_default();
        Ok(page(&artifacts, next_token))
    }

    async fn batch_get_manifests(&self, repository: &str, tags: &[String]) -> Result<Vec<String>> {
        self.record(format!("BatchGetImage {} {}", repository, tags.join(",")));
        assert!(tags.len() <= 100);
        Ok(tags
            .iter()
            .filter_map(|tag| {
                self.manifests
                    .get(&(repository.to_string(), tag.clone()))
                    .cloned()
            })
            .collect())
    }

    async fn batch_delete(&self, repository: &str, digests: &[String]) -> Result<DeleteOutcome> {
        self.record(format!("BatchDeleteImage {} {}", repository, digests.len()));
        assert!(digests.len() <= 100);
        if self
            .fail_deletes_after
            .is_some_and(|n| self.count("BatchDeleteImage") > n)
        {
            return Err(Error::provider("ecr:BatchDeleteImage", "throttled"));
        }
        let mut outcome = DeleteOutcome::default();
        for digest in digests {
            if self.undeletable.contains(digest) {
                outcome.failures.push(DeleteFailure {
                    digest: digest.clone(),
                    code: "ImageReferencedByManifestList".to_string(),
                    reason: "referenced by an index".to_string(),
                });
            } else {
                outcome.deleted.push(digest.clone());
            }
        }
        self.deleted
            .lock()
            .unwrap()
            .extend(outcome.deleted.iter().cloned());
        Ok(outcome)
    }
}

/// Confirmer answering with a fixed reply and recording prompts
pub struct ScriptedConfirmer {
    reply: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(reply: bool) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply)
    }
}

/// Log lines captured from the current thread's tracing subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Capture events until the returned guard is dropped
    pub fn install() -> (Self, DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
