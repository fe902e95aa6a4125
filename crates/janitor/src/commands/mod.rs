//! Command implementations

pub mod delete;
pub mod plan;
pub mod scan;
pub mod version;

use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use camino::Utf8Path;
use janitor_aws::AwsClients;
use janitor_collector::{load_files, Collector};
use janitor_core::{CancelToken, Error, JanitorConfig, LiveImageTable};
use janitor_retention::{Plan, Planner};
use tracing::info;

/// Configuration and clients for one run
pub struct Session {
    pub config: JanitorConfig,
    pub clients: AwsClients,
    pub cancel: CancelToken,
}

impl Session {
    pub async fn open(config_path: &Utf8Path, region: Option<&str>, cancel: CancelToken) -> Result<Self> {
        let config = JanitorConfig::load(config_path)
            .with_context(|| format!("Failed to load configuration from {}", config_path))?;
        let clients = AwsClients::load(region).await?;
        Ok(Self {
            config,
            clients,
            cancel,
        })
    }

    /// Scan every configured platform
    pub async fn scan(&self) -> Result<LiveImageTable> {
        let collector = Collector::new(
            self.clients.platforms(),
            self.cancel.clone(),
            self.config.max_concurrency,
        );
        Ok(collector.collect(&self.config).await?)
    }

    /// Prescanned files merged with a fresh scan unless `--no-scan`
    pub async fn live_set(&self, target: &TargetArgs) -> Result<LiveImageTable> {
        check_live_sources(target)?;
        let mut live = load_files(&target.scanned_files)?;
        if target.no_scan {
            info!("Skipping workload scan, using {} scanned references", live.len());
        } else {
            live.merge(self.scan().await?);
        }
        Ok(live)
    }

    pub async fn plan(&self, live: &LiveImageTable, repository: Option<&str>) -> Result<Plan> {
        let planner = Planner::new(
            self.clients.registry(),
            self.clients.region(),
            self.cancel.clone(),
        );
        Ok(planner
            .plan(&self.config.repositories, live, repository)
            .await?)
    }
}

/// `--no-scan` without any scanned file would treat every image as unused
pub fn check_live_sources(target: &TargetArgs) -> janitor_core::Result<()> {
    if target.no_scan && target.scanned_files.is_empty() {
        return Err(Error::configuration(
            "--no-scan requires at least one --scanned-files entry",
        ));
    }
    Ok(())
}
