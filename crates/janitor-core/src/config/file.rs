//! Raw configuration file model (`ecr-janitor.yaml`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration file as written by the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Files listing references that must never be deleted
    #[serde(default)]
    pub exclude_files: Vec<String>,

    /// ECS clusters whose tasks and services are scanned
    #[serde(default)]
    pub clusters: Option<Vec<NameSelector>>,

    /// Task definition families whose recent revisions are kept
    #[serde(default)]
    pub task_definitions: Option<Vec<CountedSelector>>,

    /// Lambda functions whose aliased and recent versions are kept
    #[serde(default)]
    pub lambda_functions: Option<Vec<CountedSelector>>,

    /// EKS clusters whose workloads are scanned
    #[serde(default)]
    pub eks_clusters: Option<Vec<NameSelector>>,

    /// Operator commands printing extra references as a JSON array
    #[serde(default)]
    pub external_commands: Vec<ExternalCommandFile>,

    /// Retention policies
    #[serde(default)]
    pub repositories: Vec<RepositoryFile>,

    /// Fan-out bound for per-resource scans
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

/// `name` or `name_pattern`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
}

/// Selector with a number of most recent revisions/versions to keep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountedSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalCommandFile {
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default)]
    pub keep_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keep_tag_patterns: Vec<String>,
}
