//! ECR registry backed by the AWS SDK

use crate::error::provider_error;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecr::primitives::DateTime as AwsDateTime;
use aws_sdk_ecr::types::{ImageDetail, ImageIdentifier};
use aws_sdk_ecr::Client;
use chrono::{DateTime, Utc};
use janitor_core::artifact::media_type;
use janitor_core::{ArtifactClass, ArtifactDetail, Error, Page, Result};
use janitor_retention::{DeleteFailure, DeleteOutcome, RegistryApi};
use tracing::{debug, warn};

/// Manifest types requested from BatchGetImage
const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    media_type::OCI_IMAGE_INDEX,
    media_type::DOCKER_MANIFEST_LIST,
    media_type::OCI_MANIFEST,
    media_type::DOCKER_MANIFEST_V1,
    media_type::DOCKER_MANIFEST_V2,
];

pub struct EcrRegistry {
    client: Client,
}

impl EcrRegistry {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn to_chrono(time: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

/// Convert a described image, rejecting entries without digest or push time
pub fn artifact_detail(detail: &ImageDetail) -> Result<ArtifactDetail> {
    let digest = detail
        .image_digest()
        .ok_or_else(|| Error::decode("image detail", "missing imageDigest"))?;
    let pushed_at = detail
        .image_pushed_at()
        .and_then(to_chrono)
        .ok_or_else(|| Error::decode(digest, "missing or invalid imagePushedAt"))?;

    Ok(ArtifactDetail {
        registry_id: detail.registry_id().unwrap_or_default().to_string(),
        repository: detail.repository_name().unwrap_or_default().to_string(),
        digest: digest.to_string(),
        tags: detail.image_tags().to_vec(),
        pushed_at,
        size_bytes: detail
            .image_size_in_bytes()
            .and_then(|s| u64::try_from(s).ok())
            .unwrap_or_default(),
        class: ArtifactClass::classify(
            detail.artifact_media_type(),
            detail.image_manifest_media_type(),
        ),
    })
}

#[async_trait]
impl RegistryApi for EcrRegistry {
    async fn list_repositories(
        &self,
        name: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .describe_repositories()
            .set_repository_names(name.map(|n| vec![n.to_string()]))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("ecr:DescribeRepositories"))?;

        let names = output
            .repositories()
            .iter()
            .filter_map(|r| r.repository_name().map(String::from))
            .collect();
        Ok(Page::new(names, output.next_token().map(String::from)))
    }

    async fn describe_images(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<Page<ArtifactDetail>> {
        let output = self
            .client
            .describe_images()
            .repository_name(repository)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("ecr:DescribeImages"))?;

        let mut artifacts = Vec::with_capacity(output.image_details().len());
        for detail in output.image_details() {
            match artifact_detail(detail) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) if e.is_recoverable() => warn!("Skipping image in {}: {}", repository, e),
                Err(e) => return Err(e),
            }
        }
        Ok(Page::new(artifacts, output.next_token().map(String::from)))
    }

    async fn batch_get_manifests(&self, repository: &str, tags: &[String]) -> Result<Vec<String>> {
        let ids = tags
            .iter()
            .map(|tag| ImageIdentifier::builder().image_tag(tag).build())
            .collect();
        let output = self
            .client
            .batch_get_image()
            .repository_name(repository)
            .set_image_ids(Some(ids))
            .set_accepted_media_types(Some(
                ACCEPTED_MEDIA_TYPES.iter().map(|m| m.to_string()).collect(),
            ))
            .send()
            .await
            .map_err(provider_error("ecr:BatchGetImage"))?;

        for failure in output.failures() {
            debug!(
                "BatchGetImage failure in {}: {} {}",
                repository,
                failure.failure_code().map(|c| c.as_str()).unwrap_or_default(),
                failure.failure_reason().unwrap_or_default()
            );
        }
        Ok(output
            .images()
            .iter()
            .filter_map(|image| image.image_manifest().map(String::from))
            .collect())
    }

    async fn batch_delete(&self, repository: &str, digests: &[String]) -> Result<DeleteOutcome> {
        let ids = digests
            .iter()
            .map(|digest| ImageIdentifier::builder().image_digest(digest).build())
            .collect();
        let output = self
            .client
            .batch_delete_image()
            .repository_name(repository)
            .set_image_ids(Some(ids))
            .send()
            .await
            .map_err(provider_error("ecr:BatchDeleteImage"))?;

        Ok(DeleteOutcome {
            deleted: output
                .image_ids()
                .iter()
                .filter_map(|id| id.image_digest().map(String::from))
                .collect(),
            failures: output
                .failures()
                .iter()
                .map(|f| DeleteFailure {
                    digest: f
                        .image_id()
                        .and_then(|id| id.image_digest())
                        .unwrap_or_default()
                        .to_string(),
                    code: f
                        .failure_code()
                        .map(|c| c.as_str().to_string())
                        .unwrap_or_default(),
                    reason: f.failure_reason().unwrap_or_default().to_string(),
                })
                .collect(),
        })
    }
}
