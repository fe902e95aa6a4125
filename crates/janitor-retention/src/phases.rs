//! Three-phase retention cascade
//!
//! 1. Container images are judged by live references, tag patterns, age and
//!    the keep-count buffer. Every expiring image whose `sha256-<digest>`
//!    tag exists in the repository yields a cascade key.
//! 2. Image indexes carrying a cascade key as a tag expire with the image.
//! 3. Attached (SOCI) indexes referenced from the manifests behind the
//!    cascade keys expire as well.

use crate::manifest::IndexManifest;
use crate::traits::{RegistryApi, BATCH_GET_IMAGE_LIMIT};
use janitor_core::{
    ArtifactClass, ArtifactDetail, CancelToken, ImageReference, LiveImageTable, RegistryHost,
    RepositoryPolicy, Result,
};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Artifacts of one repository by class, each list newest first
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub repository: String,
    pub images: Vec<ArtifactDetail>,
    pub image_indexes: Vec<ArtifactDetail>,
    pub attached_indexes: Vec<ArtifactDetail>,
    /// Every tag seen on any artifact
    tags: BTreeSet<String>,
}

impl Inventory {
    pub fn new(repository: impl Into<String>, artifacts: Vec<ArtifactDetail>) -> Self {
        let mut inventory = Self {
            repository: repository.into(),
            ..Default::default()
        };
        for artifact in artifacts {
            inventory.tags.extend(artifact.tags.iter().cloned());
            match artifact.class {
                ArtifactClass::ContainerImage => inventory.images.push(artifact),
                ArtifactClass::ImageIndex => inventory.image_indexes.push(artifact),
                ArtifactClass::AttachedIndex => inventory.attached_indexes.push(artifact),
                ArtifactClass::Unknown => warn!(
                    repository = %inventory.repository,
                    digest = %artifact.digest,
                    "Unknown artifact type, ignored"
                ),
            }
        }
        // stable: equal push times keep listing order
        for list in [
            &mut inventory.images,
            &mut inventory.image_indexes,
            &mut inventory.attached_indexes,
        ] {
            list.sort_by_key(|a| Reverse(a.pushed_at));
        }
        inventory
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Why a container image is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retention {
    /// Digest-qualified reference is live
    LiveDigest,
    /// Tag matches a keep-tag pattern
    TagPattern(String),
    /// Tag-qualified reference is live
    LiveTag(String),
    NotExpired,
    /// Position among expired tagged images, within the keep count
    KeepCount(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Keep(Retention),
    Expire,
}

/// Inputs shared by every phase of one repository
pub struct RetentionContext<'a> {
    pub policy: &'a RepositoryPolicy,
    pub live: &'a LiveImageTable,
    /// Region of the registry, used to rebuild fully qualified references
    pub region: &'a str,
}

impl RetentionContext<'_> {
    fn host(&self, detail: &ArtifactDetail) -> RegistryHost {
        RegistryHost::new(detail.registry_id.as_str(), self.region)
    }

    /// Keep rules that do not depend on position
    fn unconditional_keep(&self, detail: &ArtifactDetail) -> Option<Retention> {
        let repo = &detail.repository;
        let host = self.host(detail);
        let by_digest = ImageReference::digested(&host, repo, &detail.digest);
        debug!("checking {}", by_digest);
        if self.live.contains(&by_digest) {
            info!("{}@{} is in use, keep it", repo, detail.digest);
            return Some(Retention::LiveDigest);
        }
        for tag in &detail.tags {
            if self.policy.matches_tag(tag) {
                info!("image {}:{} is matched by tag condition, keep it", repo, tag);
                return Some(Retention::TagPattern(tag.clone()));
            }
            let by_tag = ImageReference::tagged(&host, repo, tag);
            debug!("checking {}", by_tag);
            if self.live.contains(&by_tag) {
                info!("image {}:{} is in use, keep it", repo, tag);
                return Some(Retention::LiveTag(tag.clone()));
            }
        }
        None
    }

    /// Verdict for one image; `expired_tagged` counts expired tagged images seen so far
    fn judge(&self, detail: &ArtifactDetail, expired_tagged: &mut u64) -> Verdict {
        if let Some(retention) = self.unconditional_keep(detail) {
            return Verdict::Keep(retention);
        }
        let name = detail.display_name();
        if !self.policy.is_expired(detail.pushed_at) {
            info!("image {} is not expired, keep it", name);
            return Verdict::Keep(Retention::NotExpired);
        }
        if detail.is_tagged() {
            *expired_tagged += 1;
            if *expired_tagged <= self.policy.keep_count {
                info!(
                    "image {} is in keep_count {} <= {}, keep it",
                    name, expired_tagged, self.policy.keep_count
                );
                return Verdict::Keep(Retention::KeepCount(*expired_tagged));
            }
        }
        info!(
            action = "expire",
            "image {} is expired {} {}",
            name,
            detail.digest,
            detail.pushed_at.to_rfc3339()
        );
        Verdict::Expire
    }
}

/// Verdicts of the container image phase, in push order (newest first)
#[derive(Debug)]
pub struct ImagePhase<'a> {
    pub verdicts: Vec<(&'a ArtifactDetail, Verdict)>,
    /// `sha256-<digest>` tags of expiring images present in the repository
    pub cascade_keys: BTreeSet<String>,
}

impl<'a> ImagePhase<'a> {
    pub fn expired(&self) -> impl Iterator<Item = &'a ArtifactDetail> + '_ {
        self.verdicts
            .iter()
            .filter(|(_, verdict)| *verdict == Verdict::Expire)
            .map(|(detail, _)| *detail)
    }
}

/// Judge every container image of the inventory
///
/// The keep-count buffer is positional: it counts only tagged images that
/// already failed every other rule, walking from the newest push.
pub fn container_image_phase<'a>(
    inventory: &'a Inventory,
    ctx: &RetentionContext<'_>,
) -> ImagePhase<'a> {
    let mut verdicts = Vec::with_capacity(inventory.images.len());
    let mut cascade_keys = BTreeSet::new();
    let mut expired_tagged = 0u64;

    for detail in &inventory.images {
        let verdict = ctx.judge(detail, &mut expired_tagged);
        if verdict == Verdict::Expire {
            let key = detail.cascade_tag();
            if inventory.has_tag(&key) {
                cascade_keys.insert(key);
            }
        }
        verdicts.push((detail, verdict));
    }

    ImagePhase {
        verdicts,
        cascade_keys,
    }
}

/// Image indexes tagged with a cascade key
pub fn image_index_phase<'a>(
    inventory: &'a Inventory,
    cascade_keys: &BTreeSet<String>,
) -> Vec<&'a ArtifactDetail> {
    inventory
        .image_indexes
        .iter()
        .filter(|detail| {
            debug!("is an image index {}", detail.digest);
            match detail.tags.iter().find(|tag| cascade_keys.contains(*tag)) {
                Some(tag) => {
                    info!(
                        action = "expire",
                        "{}:{} is expired (image index)", inventory.repository, tag
                    );
                    true
                }
                None => false,
            }
        })
        .collect()
}

/// Digests of attached indexes referenced by the manifests behind the cascade keys
///
/// Manifests that fail to decode are logged and skipped.
pub async fn attached_index_digests(
    registry: &dyn RegistryApi,
    repository: &str,
    cascade_keys: &BTreeSet<String>,
    cancel: &CancelToken,
) -> Result<BTreeSet<String>> {
    let keys: Vec<String> = cascade_keys.iter().cloned().collect();
    let mut digests = BTreeSet::new();
    for chunk in keys.chunks(BATCH_GET_IMAGE_LIMIT) {
        cancel.check()?;
        for raw in registry.batch_get_manifests(repository, chunk).await? {
            match IndexManifest::parse(&raw) {
                Ok(index) => digests.extend(index.attached_index_digests().map(String::from)),
                Err(e) => warn!("failed to parse manifest on {}: {}: {}", repository, e, raw),
            }
        }
    }
    Ok(digests)
}

/// Attached indexes whose digest was found behind a cascade key
pub fn attached_index_phase<'a>(
    inventory: &'a Inventory,
    digests: &BTreeSet<String>,
) -> Vec<&'a ArtifactDetail> {
    inventory
        .attached_indexes
        .iter()
        .filter(|detail| {
            debug!("is an attached index {}", detail.digest);
            let expired = digests.contains(&detail.digest);
            if expired {
                info!(
                    action = "expire",
                    "{}@{} is expired (attached index)", inventory.repository, detail.digest
                );
            }
            expired
        })
        .collect()
}
