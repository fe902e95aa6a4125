//! Platform API seams
//!
//! The scanners drive pagination themselves (one call per page) so that
//! every page boundary observes cancellation. Implementations backed by
//! the AWS SDK live in `janitor-aws`; tests use in-memory fakes.

use async_trait::async_trait;
pub use janitor_core::Page;
use janitor_core::Result;
use k8s_openapi::api::apps::v1::{ControllerRevision, ReplicaSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;

/// Desired status filter for ECS task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Running,
    Stopped,
}

/// Container as reported on a described task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContainer {
    pub name: String,
    pub image: Option<String>,
    /// Digest the container runtime actually pulled
    pub image_digest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDescription {
    pub task_arn: String,
    pub task_definition_arn: String,
    pub containers: Vec<TaskContainer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDeployment {
    pub status: String,
    pub task_definition_arn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDescription {
    pub service_name: String,
    pub deployments: Vec<ServiceDeployment>,
}

/// Elastic Container Service
#[async_trait]
pub trait EcsApi: Send + Sync {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>>;

    async fn list_tasks(
        &self,
        cluster_arn: &str,
        status: TaskStatus,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Describe at most [`crate::ecs::DESCRIBE_TASKS_LIMIT`] tasks
    async fn describe_tasks(
        &self,
        cluster_arn: &str,
        task_arns: &[String],
    ) -> Result<Vec<TaskDescription>>;

    async fn list_services(&self, cluster_arn: &str, next_token: Option<String>)
        -> Result<Page<String>>;

    /// Describe at most [`crate::ecs::DESCRIBE_SERVICES_LIMIT`] services
    async fn describe_services(
        &self,
        cluster_arn: &str,
        service_arns: &[String],
    ) -> Result<Vec<ServiceDescription>>;

    async fn list_task_definition_families(&self, next_token: Option<String>)
        -> Result<Page<String>>;

    /// Task definition ARNs of a family, newest revision first
    async fn list_task_definitions(
        &self,
        family: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Container images declared by a task definition (`family:revision`)
    async fn task_definition_images(&self, task_definition: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSummary {
    pub function_name: String,
    pub function_arn: String,
    /// `Image` or `Zip`
    pub package_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionVersion {
    /// Numeric version or `$LATEST`
    pub version: String,
    pub function_arn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionAlias {
    pub name: String,
    pub function_version: String,
    /// Versions receiving weighted traffic through this alias
    pub additional_versions: Vec<String>,
}

/// AWS Lambda
#[async_trait]
pub trait LambdaApi: Send + Sync {
    async fn list_functions(&self, marker: Option<String>) -> Result<Page<FunctionSummary>>;

    async fn list_versions(
        &self,
        function_name: &str,
        marker: Option<String>,
    ) -> Result<Page<FunctionVersion>>;

    async fn list_aliases(
        &self,
        function_name: &str,
        marker: Option<String>,
    ) -> Result<Page<FunctionAlias>>;

    /// Image URI of a function version, `None` for non-image code
    async fn function_image(&self, function_arn: &str) -> Result<Option<String>>;
}

/// Elastic Kubernetes Service control plane
#[async_trait]
pub trait EksApi: Send + Sync {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>>;

    /// Authenticated client for a cluster's Kubernetes API
    async fn connect(&self, cluster_name: &str) -> Result<Arc<dyn KubeApi>>;
}

/// Cluster-wide Kubernetes listings, paged by continue token
#[async_trait]
pub trait KubeApi: Send + Sync {
    async fn list_pods(&self, continue_token: Option<String>) -> Result<Page<Pod>>;

    async fn list_replica_sets(&self, continue_token: Option<String>) -> Result<Page<ReplicaSet>>;

    async fn list_controller_revisions(
        &self,
        continue_token: Option<String>,
    ) -> Result<Page<ControllerRevision>>;

    async fn list_cron_jobs(&self, continue_token: Option<String>) -> Result<Page<CronJob>>;
}
