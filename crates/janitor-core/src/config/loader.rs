//! Configuration file loading and validation

use crate::config::file::ConfigFile;
use crate::config::policy::{
    resolve_path, ClusterPolicy, EksClusterPolicy, ExternalCommand, LambdaPolicy,
    RepositoryPolicy, TaskDefinitionPolicy,
};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use std::fs;
use tracing::{debug, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "ecr-janitor.yaml";

/// Default fan-out bound per platform scan
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Loaded and validated janitor configuration
#[derive(Debug, Clone)]
pub struct JanitorConfig {
    /// Exclude files, resolved against the configuration directory
    pub exclude_files: Vec<Utf8PathBuf>,
    pub clusters: Vec<ClusterPolicy>,
    pub task_definitions: Vec<TaskDefinitionPolicy>,
    pub lambda_functions: Vec<LambdaPolicy>,
    pub eks_clusters: Vec<EksClusterPolicy>,
    pub external_commands: Vec<ExternalCommand>,
    pub repositories: Vec<RepositoryPolicy>,
    pub max_concurrency: usize,

    /// Path to the configuration file
    pub config_path: Utf8PathBuf,
}

impl JanitorConfig {
    /// Load and validate the configuration file at `path`
    ///
    /// Repository cutoffs are resolved against the current instant.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::configuration(format!("configuration file not found: {}", path))
            } else {
                Error::Io(e)
            }
        })?;
        debug!("Loaded configuration from {}", path);
        Self::from_yaml(&content, path, Utc::now())
    }

    /// Parse and validate YAML content as if it was read from `path`
    pub fn from_yaml(content: &str, path: &Utf8Path, now: DateTime<Utc>) -> Result<Self> {
        let file: ConfigFile = serde_yaml_ng::from_str(content)?;
        Self::from_file(file, path, now)
    }

    /// Validate a parsed configuration file
    pub fn from_file(file: ConfigFile, path: &Utf8Path, now: DateTime<Utc>) -> Result<Self> {
        let base_dir = path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .map(|p| p.to_owned())
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        if file.clusters.is_none() {
            warn!("clusters are not defined, no ECS clusters will be scanned for images in use");
        }
        let clusters = file
            .clusters
            .iter()
            .flatten()
            .map(ClusterPolicy::from_file)
            .collect::<Result<Vec<_>>>()?;

        if file.task_definitions.is_none() {
            warn!("task_definitions are not defined, no task definitions will be scanned for images in use");
        }
        let task_definitions = file
            .task_definitions
            .iter()
            .flatten()
            .map(TaskDefinitionPolicy::from_file)
            .collect::<Result<Vec<_>>>()?;

        if file.lambda_functions.is_none() {
            warn!("lambda_functions are not defined, no Lambda functions will be scanned for images in use");
        }
        let lambda_functions = file
            .lambda_functions
            .iter()
            .flatten()
            .map(LambdaPolicy::from_file)
            .collect::<Result<Vec<_>>>()?;

        if file.eks_clusters.is_none() {
            warn!("eks_clusters are not defined, no EKS clusters will be scanned for images in use");
        }
        let eks_clusters = file
            .eks_clusters
            .iter()
            .flatten()
            .map(EksClusterPolicy::from_file)
            .collect::<Result<Vec<_>>>()?;

        let external_commands = file
            .external_commands
            .iter()
            .map(|c| ExternalCommand::from_file(c, &base_dir))
            .collect::<Result<Vec<_>>>()?;

        let repositories = file
            .repositories
            .iter()
            .map(|r| RepositoryPolicy::from_file(r, now))
            .collect::<Result<Vec<_>>>()?;

        let mut exclude_files = Vec::with_capacity(file.exclude_files.len());
        for ex in &file.exclude_files {
            let resolved = resolve_path(&base_dir, ex);
            fs::metadata(&resolved).map_err(|e| {
                Error::configuration(format!("exclude_files: {}: {}", resolved, e))
            })?;
            exclude_files.push(resolved);
        }

        let max_concurrency = match file.max_concurrency {
            None => DEFAULT_MAX_CONCURRENCY,
            Some(0) => {
                return Err(Error::configuration(
                    "max_concurrency must be greater than zero",
                ))
            }
            Some(n) => n,
        };

        Ok(Self {
            exclude_files,
            clusters,
            task_definitions,
            lambda_functions,
            eks_clusters,
            external_commands,
            repositories,
            max_concurrency,
            config_path: path.to_owned(),
        })
    }
}
