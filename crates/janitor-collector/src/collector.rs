//! Live-set collection across every configured platform

use crate::ecs::EcsScanner;
use crate::eks::EksScanner;
use crate::external::ExternalScanner;
use crate::files::load_files;
use crate::lambda::LambdaScanner;
use crate::traits::{EcsApi, EksApi, LambdaApi};
use janitor_core::{CancelToken, JanitorConfig, LiveImageTable, Result};
use std::sync::Arc;
use tracing::info;

/// Authenticated platform clients
#[derive(Clone)]
pub struct Platforms {
    pub ecs: Arc<dyn EcsApi>,
    pub lambda: Arc<dyn LambdaApi>,
    pub eks: Arc<dyn EksApi>,
}

/// Runs every platform scan and merges the results
///
/// Scans are independent and run concurrently. Any failure aborts the
/// whole collection: a partial live set could let in-use images be deleted.
pub struct Collector {
    ecs: EcsScanner,
    lambda: LambdaScanner,
    eks: EksScanner,
    external: ExternalScanner,
}

impl Collector {
    pub fn new(platforms: Platforms, cancel: CancelToken, max_concurrency: usize) -> Self {
        Self {
            ecs: EcsScanner::new(platforms.ecs, cancel.clone(), max_concurrency),
            lambda: LambdaScanner::new(platforms.lambda, cancel.clone(), max_concurrency),
            eks: EksScanner::new(platforms.eks, cancel.clone(), max_concurrency),
            external: ExternalScanner::new(cancel),
        }
    }

    pub async fn collect(&self, config: &JanitorConfig) -> Result<LiveImageTable> {
        info!("Scanning resources");
        let (ecs, lambda, eks, external) = tokio::try_join!(
            self.ecs.scan(&config.clusters, &config.task_definitions),
            self.lambda.scan(&config.lambda_functions),
            self.eks.scan(&config.eks_clusters),
            self.external.scan(&config.external_commands),
        )?;
        let excluded = load_files(&config.exclude_files)?;

        let mut live = LiveImageTable::new();
        for table in [ecs, lambda, eks, external, excluded] {
            live.merge(table);
        }
        info!("Found {} image references in use", live.len());
        Ok(live)
    }
}
