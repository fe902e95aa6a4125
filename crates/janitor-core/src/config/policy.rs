//! Validated, immutable policies
//!
//! Everything in here is produced once at load time from the raw
//! [`super::file`] model and stays read-only for the rest of the run.

use crate::arn::cluster_arn_to_name;
use crate::config::duration::parse_duration;
use crate::config::file::{CountedSelector, ExternalCommandFile, NameSelector, RepositoryFile};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

/// Keep count used for task definitions and Lambda functions when omitted
pub const DEFAULT_KEEP_COUNT: u64 = 5;

/// Keep-tag patterns used when a repository declares none
pub const DEFAULT_KEEP_TAG_PATTERNS: &[&str] = &["latest"];

/// Exact name or shell-glob pattern
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Exact(String),
    Pattern(GlobMatcher),
}

impl NameMatcher {
    /// Build from the mutually exclusive `name` / `name_pattern` fields
    pub fn from_fields(
        section: &str,
        name: Option<&str>,
        name_pattern: Option<&str>,
    ) -> Result<Self> {
        let name = name.filter(|s| !s.is_empty());
        let name_pattern = name_pattern.filter(|s| !s.is_empty());
        match (name, name_pattern) {
            (Some(_), Some(_)) => Err(Error::configuration(format!(
                "{}: name and name_pattern are exclusive",
                section
            ))),
            (None, None) => Err(Error::configuration(format!(
                "{}: name or name_pattern is required",
                section
            ))),
            (Some(name), None) => Ok(Self::Exact(name.to_string())),
            (None, Some(pattern)) => Ok(Self::Pattern(compile_glob(section, pattern)?)),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == name,
            Self::Pattern(glob) => glob.is_match(name),
        }
    }

    /// Name or pattern as written in the configuration
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(name) => name,
            Self::Pattern(glob) => glob.glob().glob(),
        }
    }
}

fn compile_glob(section: &str, pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| Error::configuration(format!("{}: invalid pattern {:?}: {}", section, pattern, e)))
}

/// ECS cluster selection
#[derive(Debug, Clone)]
pub struct ClusterPolicy {
    pub matcher: NameMatcher,
}

impl ClusterPolicy {
    pub fn from_file(selector: &NameSelector) -> Result<Self> {
        Ok(Self {
            matcher: NameMatcher::from_fields(
                "clusters",
                selector.name.as_deref(),
                selector.name_pattern.as_deref(),
            )?,
        })
    }

    /// Match a cluster ARN or name
    pub fn matches(&self, cluster: &str) -> bool {
        self.matcher.matches(&cluster_arn_to_name(cluster))
    }
}

/// Task definition family selection with revision retention
#[derive(Debug, Clone)]
pub struct TaskDefinitionPolicy {
    pub matcher: NameMatcher,
    pub keep_count: u64,
}

impl TaskDefinitionPolicy {
    pub fn from_file(selector: &CountedSelector) -> Result<Self> {
        let matcher = NameMatcher::from_fields(
            "task_definitions",
            selector.name.as_deref(),
            selector.name_pattern.as_deref(),
        )?;
        let keep_count = counted_keep_count("task_definitions", &matcher, selector.keep_count);
        Ok(Self {
            matcher,
            keep_count,
        })
    }

    pub fn matches(&self, family: &str) -> bool {
        self.matcher.matches(family)
    }
}

/// Lambda function selection with version retention
#[derive(Debug, Clone)]
pub struct LambdaPolicy {
    pub matcher: NameMatcher,
    pub keep_count: u64,
}

impl LambdaPolicy {
    pub fn from_file(selector: &CountedSelector) -> Result<Self> {
        let matcher = NameMatcher::from_fields(
            "lambda_functions",
            selector.name.as_deref(),
            selector.name_pattern.as_deref(),
        )?;
        let keep_count = counted_keep_count("lambda_functions", &matcher, selector.keep_count);
        Ok(Self {
            matcher,
            keep_count,
        })
    }

    pub fn matches(&self, function_name: &str) -> bool {
        self.matcher.matches(function_name)
    }
}

fn counted_keep_count(section: &str, matcher: &NameMatcher, keep_count: Option<u64>) -> u64 {
    match keep_count {
        Some(n) if n > 0 => n,
        _ => {
            warn!(
                "keep_count for {} {} is not defined, using default keep_count={}",
                section,
                matcher.as_str(),
                DEFAULT_KEEP_COUNT
            );
            DEFAULT_KEEP_COUNT
        }
    }
}

/// EKS cluster selection
#[derive(Debug, Clone)]
pub struct EksClusterPolicy {
    pub matcher: NameMatcher,
}

impl EksClusterPolicy {
    pub fn from_file(selector: &NameSelector) -> Result<Self> {
        Ok(Self {
            matcher: NameMatcher::from_fields(
                "eks_clusters",
                selector.name.as_deref(),
                selector.name_pattern.as_deref(),
            )?,
        })
    }

    pub fn matches(&self, cluster_name: &str) -> bool {
        self.matcher.matches(cluster_name)
    }
}

/// Operator-declared command printing live references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub command: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub dir: Option<Utf8PathBuf>,
    pub timeout: Option<Duration>,
}

impl ExternalCommand {
    pub fn from_file(file: &ExternalCommandFile, base_dir: &Utf8Path) -> Result<Self> {
        if file.command.is_empty() || file.command[0].is_empty() {
            return Err(Error::configuration(
                "external_commands: command must not be empty",
            ));
        }
        let timeout = match file.timeout.as_deref() {
            Some(s) => Some(parse_duration(s)?).filter(|d| !d.is_zero()),
            None => None,
        };
        let dir = file.dir.as_deref().map(|d| resolve_path(base_dir, d));
        Ok(Self {
            command: file.command.clone(),
            env: file.env.clone(),
            dir,
            timeout,
        })
    }

    /// Command line for logs and consumer labels
    pub fn display(&self) -> String {
        self.command.join(" ")
    }
}

/// Per-repository retention policy with its cutoff already resolved
#[derive(Debug, Clone)]
pub struct RepositoryPolicy {
    pub matcher: NameMatcher,
    pub expires: Duration,
    /// Artifacts pushed before this instant are time-expired
    pub cutoff: DateTime<Utc>,
    pub keep_count: u64,
    pub keep_tag_patterns: Vec<String>,
    keep_tags: GlobSet,
}

impl RepositoryPolicy {
    /// Validate a repository entry, resolving `expires` against `now`
    pub fn from_file(file: &RepositoryFile, now: DateTime<Utc>) -> Result<Self> {
        let matcher = NameMatcher::from_fields(
            "repositories",
            file.name.as_deref(),
            file.name_pattern.as_deref(),
        )?;
        let expires_str = file.expires.as_deref().ok_or_else(|| {
            Error::configuration(format!(
                "repository {}: expires is required",
                matcher.as_str()
            ))
        })?;
        let expires = parse_duration(expires_str)?;
        let expires_chrono = chrono::Duration::from_std(expires).map_err(|e| {
            Error::configuration(format!("repository {}: expires: {}", matcher.as_str(), e))
        })?;
        let cutoff = now.checked_sub_signed(expires_chrono).ok_or_else(|| {
            Error::configuration(format!(
                "repository {}: expires {} is out of range",
                matcher.as_str(),
                expires_str
            ))
        })?;

        let keep_tag_patterns: Vec<String> = if file.keep_tag_patterns.is_empty() {
            warn!(
                "keep_tag_patterns are not defined for repository {}, using default {:?}",
                matcher.as_str(),
                DEFAULT_KEEP_TAG_PATTERNS
            );
            DEFAULT_KEEP_TAG_PATTERNS.iter().map(|s| s.to_string()).collect()
        } else {
            file.keep_tag_patterns.clone()
        };
        let mut builder = GlobSetBuilder::new();
        for pattern in &keep_tag_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                Error::configuration(format!(
                    "repository {}: invalid keep_tag_pattern {:?}: {}",
                    matcher.as_str(),
                    pattern,
                    e
                ))
            })?;
            builder.add(glob);
        }
        let keep_tags = builder
            .build()
            .map_err(|e| Error::configuration(format!("keep_tag_patterns: {}", e)))?;

        Ok(Self {
            matcher,
            expires,
            cutoff,
            keep_count: file.keep_count,
            keep_tag_patterns,
            keep_tags,
        })
    }

    pub fn matches_name(&self, repository: &str) -> bool {
        self.matcher.matches(repository)
    }

    /// First policy in declaration order whose name matches `repository`
    pub fn first_match<'a>(policies: &'a [Self], repository: &str) -> Option<&'a Self> {
        policies.iter().find(|policy| policy.matches_name(repository))
    }

    /// Whether the tag is pinned by a keep-tag pattern
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.keep_tags.is_match(tag)
    }

    /// Whether an artifact pushed at `pushed_at` is past the cutoff
    pub fn is_expired(&self, pushed_at: DateTime<Utc>) -> bool {
        pushed_at < self.cutoff
    }
}

/// Resolve a possibly relative path against the configuration directory
pub fn resolve_path(base_dir: &Utf8Path, path: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(path);
    if path.is_absolute() {
        path.to_owned()
    } else {
        base_dir.join(path)
    }
}
