//! Amazon Resource Name parsing

use crate::error::{Error, Result};
use std::fmt;

/// A parsed ARN: `arn:partition:service:region:account:resource`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.splitn(6, ':');
        let invalid = || Error::configuration(format!("invalid ARN: {}", s));
        if parts.next() != Some("arn") {
            return Err(invalid());
        }
        let partition = parts.next().ok_or_else(invalid)?;
        let service = parts.next().ok_or_else(invalid)?;
        let region = parts.next().ok_or_else(invalid)?;
        let account_id = parts.next().ok_or_else(invalid)?;
        let resource = parts.next().ok_or_else(invalid)?;
        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
        })
    }
}

/// Reduce an ARN to its resource name, stripping `resource_prefix`
///
/// Anything that is not an ARN is returned unchanged.
pub fn arn_to_name(name: &str, resource_prefix: &str) -> String {
    match Arn::parse(name) {
        Ok(arn) => arn.resource.replacen(resource_prefix, "", 1),
        Err(_) => name.to_string(),
    }
}

/// ECS cluster name from a cluster ARN or plain name
pub fn cluster_arn_to_name(arn: &str) -> String {
    arn_to_name(arn, "cluster/")
}

/// Task definition identity (`family:revision`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskDefinitionRef {
    pub family: String,
    pub revision: u32,
}

impl TaskDefinitionRef {
    /// Parse a task definition ARN
    ///
    /// Rejects ARNs of other services or other ECS resource types.
    pub fn from_arn(s: &str) -> Result<Self> {
        let arn = Arn::parse(s)?;
        if arn.service != "ecs" {
            return Err(Error::configuration(format!(
                "not an ECS task definition ARN: {}",
                s
            )));
        }
        let (kind, rest) = arn
            .resource
            .split_once('/')
            .ok_or_else(|| Error::configuration(format!("invalid task definition ARN: {}", s)))?;
        if kind != "task-definition" {
            return Err(Error::configuration(format!(
                "not a task definition ARN: {}",
                s
            )));
        }
        let (family, revision) = rest
            .split_once(':')
            .ok_or_else(|| Error::configuration(format!("invalid task definition name: {}", s)))?;
        let revision = revision.parse::<u32>().map_err(|e| {
            Error::configuration(format!("invalid task definition revision in {}: {}", s, e))
        })?;
        Ok(Self {
            family: family.to_string(),
            revision,
        })
    }
}

impl fmt::Display for TaskDefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.revision)
    }
}
