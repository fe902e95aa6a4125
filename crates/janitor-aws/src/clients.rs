//! Shared AWS configuration

use crate::ecr::EcrRegistry;
use crate::ecs::EcsClient;
use crate::eks::EksClient;
use crate::lambda::LambdaClient;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ecr::config::Region;
use janitor_collector::Platforms;
use janitor_core::{Error, Result};
use janitor_retention::RegistryApi;
use std::sync::Arc;
use tracing::{debug, info};

/// One loaded AWS configuration shared by every service client
///
/// Credentials and region come from the standard provider chain
/// (environment, profile, instance metadata). The registry is assumed to
/// live in the same account and region as the workloads.
#[derive(Clone)]
pub struct AwsClients {
    config: SdkConfig,
    region: String,
}

impl AwsClients {
    /// Load configuration, optionally overriding the region
    pub async fn load(region: Option<&str>) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        let region = config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| Error::configuration("no AWS region configured (set AWS_REGION or --region)"))?;
        debug!("Loaded AWS configuration for region {}", region);
        info!("Using AWS region {}", region);

        Ok(Self { config, region })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Clients for every platform the collector scans
    pub fn platforms(&self) -> Platforms {
        Platforms {
            ecs: Arc::new(EcsClient::new(&self.config)),
            lambda: Arc::new(LambdaClient::new(&self.config)),
            eks: Arc::new(EksClient::new(&self.config)),
        }
    }

    pub fn registry(&self) -> Arc<dyn RegistryApi> {
        Arc::new(EcrRegistry::new(&self.config))
    }
}
