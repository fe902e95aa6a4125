//! In-memory platform fakes
//!
//! Every fake pages its listings (two items per page) and records the
//! calls it receives so tests can assert on provider traffic.

#![allow(dead_code)]

use async_trait::async_trait;
use janitor_collector::traits::{
    EcsApi, EksApi, FunctionAlias, FunctionSummary, FunctionVersion, KubeApi, LambdaApi, Page,
    ServiceDescription, TaskDescription, TaskStatus,
};
use janitor_core::{Error, Result};
use k8s_openapi::api::apps::v1::{ControllerRevision, ReplicaSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::Pod;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const PAGE_SIZE: usize = 2;
pub const REGISTRY: &str = "123456789012.dkr.ecr.us-east-1.amazonaws.com";

pub fn image(repo_and_tag: &str) -> String {
    format!("{}/{}", REGISTRY, repo_and_tag)
}

/// Serve `items` in pages of [`PAGE_SIZE`]; the token is the next offset
pub fn page<T: Clone>(items: &[T], token: Option<String>) -> Page<T> {
    let start: usize = token.and_then(|t| t.parse().ok()).unwrap_or(0);
    let end = (start + PAGE_SIZE).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Page::new(items[start.min(end)..end].to_vec(), next)
}

#[derive(Default)]
pub struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[derive(Default)]
pub struct FakeEcs {
    pub clusters: Vec<String>,
    pub tasks: HashMap<(String, TaskStatus), Vec<TaskDescription>>,
    pub services: HashMap<String, Vec<ServiceDescription>>,
    pub families: Vec<String>,
    /// family → task definition ARNs, newest first
    pub task_definitions: HashMap<String, Vec<String>>,
    /// `family:revision` → declared images
    pub images: HashMap<String, Vec<String>>,
    pub fail_list_clusters: bool,
    pub log: CallLog,
}

#[async_trait]
impl EcsApi for FakeEcs {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>> {
        self.log.record("ListClusters");
        if self.fail_list_clusters {
            return Err(Error::provider("ecs:ListClusters", "throttled"));
        }
        Ok(page(&self.clusters, next_token))
    }

    async fn list_tasks(
        &self,
        cluster_arn: &str,
        status: TaskStatus,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.log.record(format!("ListTasks {} {:?}", cluster_arn, status));
        let arns: Vec<String> = self
            .tasks
            .get(&(cluster_arn.to_string(), status))
            .map(|tasks| tasks.iter().map(|t| t.task_arn.clone()).collect())
            .unwrap_or_default();
        Ok(page(&arns, next_token))
    }

    async fn describe_tasks(
        &self,
        cluster_arn: &str,
        task_arns: &[String],
    ) -> Result<Vec<TaskDescription>> {
        self.log
            .record(format!("DescribeTasks {} {}", cluster_arn, task_arns.len()));
        assert!(task_arns.len() <= 100);
        Ok(self
            .tasks
            .iter()
            .filter(|((cluster, _), _)| cluster == cluster_arn)
            .flat_map(|(_, tasks)| tasks.iter())
            .filter(|t| task_arns.contains(&t.task_arn))
            .cloned()
            .collect())
    }

    async fn list_services(
        &self,
        cluster_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.log.record(format!("ListServices {}", cluster_arn));
        let names: Vec<String> = self
            .services
            .get(cluster_arn)
            .map(|s| s.iter().map(|s| s.service_name.clone()).collect())
            .unwrap_or_default();
        Ok(page(&names, next_token))
    }

    async fn describe_services(
        &self,
        cluster_arn: &str,
        service_arns: &[String],
    ) -> Result<Vec<ServiceDescription>> {
        self.log
            .record(format!("DescribeServices {} {}", cluster_arn, service_arns.len()));
        assert!(service_arns.len() <= 10);
        Ok(self
            .services
            .get(cluster_arn)
            .into_iter()
            .flatten()
            .filter(|s| service_arns.contains(&s.service_name))
            .cloned()
            .collect())
    }

    async fn list_task_definition_families(
        &self,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.log.record("ListTaskDefinitionFamilies");
        Ok(page(&self.families, next_token))
    }

    async fn list_task_definitions(
        &self,
        family: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.log.record(format!("ListTaskDefinitions {}", family));
        let arns = self.task_definitions.get(family).cloned().unwrap_or_default();
        Ok(page(&arns, next_token))
    }

    async fn task_definition_images(&self, task_definition: &str) -> Result<Vec<String>> {
        self.log
            .record(format!("DescribeTaskDefinition {}", task_definition));
        Ok(self.images.get(task_definition).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeLambda {
    pub functions: Vec<FunctionSummary>,
    pub versions: HashMap<String, Vec<FunctionVersion>>,
    pub aliases: HashMap<String, Vec<FunctionAlias>>,
    /// function version ARN → image URI
    pub images: HashMap<String, String>,
    pub log: CallLog,
}

#[async_trait]
impl LambdaApi for FakeLambda {
    async fn list_functions(&self, marker: Option<String>) -> Result<Page<FunctionSummary>> {
        self.log.record("ListFunctions");
        Ok(page(&self.functions, marker))
    }

    async fn list_versions(
        &self,
        function_name: &str,
        marker: Option<String>,
    ) -> Result<Page<FunctionVersion>> {
        self.log.record(format!("ListVersionsByFunction {}", function_name));
        let versions = self.versions.get(function_name).cloned().unwrap_or_default();
        Ok(page(&versions, marker))
    }

    async fn list_aliases(
        &self,
        function_name: &str,
        marker: Option<String>,
    ) -> Result<Page<FunctionAlias>> {
        self.log.record(format!("ListAliases {}", function_name));
        let aliases = self.aliases.get(function_name).cloned().unwrap_or_default();
        Ok(page(&aliases, marker))
    }

    async fn function_image(&self, function_arn: &str) -> Result<Option<String>> {
        self.log.record(format!("GetFunction {}", function_arn));
        Ok(self.images.get(function_arn).cloned())
    }
}

#[derive(Default, Clone)]
pub struct FakeKube {
    pub pods: Vec<Pod>,
    pub replica_sets: Vec<ReplicaSet>,
    pub controller_revisions: Vec<ControllerRevision>,
    pub cron_jobs: Vec<CronJob>,
}

#[async_trait]
impl KubeApi for FakeKube {
    async fn list_pods(&self, continue_token: Option<String>) -> Result<Page<Pod>> {
        Ok(page(&self.pods, continue_token))
    }

    async fn list_replica_sets(&self, continue_token: Option<String>) -> Result<Page<ReplicaSet>> {
        Ok(page(&self.replica_sets, continue_token))
    }

    async fn list_controller_revisions(
        &self,
        continue_token: Option<String>,
    ) -> Result<Page<ControllerRevision>> {
        Ok(page(&self.controller_revisions, continue_token))
    }

    async fn list_cron_jobs(&self, continue_token: Option<String>) -> Result<Page<CronJob>> {
        Ok(page(&self.cron_jobs, continue_token))
    }
}

#[derive(Default)]
pub struct FakeEks {
    pub clusters: HashMap<String, FakeKube>,
    pub log: CallLog,
}

#[async_trait]
impl EksApi for FakeEks {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>> {
        self.log.record("ListClusters");
        let mut names: Vec<String> = self.clusters.keys().cloned().collect();
        names.sort();
        Ok(page(&names, next_token))
    }

    async fn connect(&self, cluster_name: &str) -> Result<Arc<dyn KubeApi>> {
        self.log.record(format!("Connect {}", cluster_name));
        let kube = self
            .clusters
            .get(cluster_name)
            .cloned()
            .ok_or_else(|| Error::provider("eks:DescribeCluster", "cluster not found"))?;
        Ok(Arc::new(kube))
    }
}
