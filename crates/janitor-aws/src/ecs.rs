//! ECS inventory backed by the AWS SDK

use crate::error::provider_error;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs::types::{DesiredStatus, SortOrder, TaskDefinitionFamilyStatus};
use aws_sdk_ecs::Client;
use janitor_collector::traits::{
    EcsApi, ServiceDeployment, ServiceDescription, TaskContainer, TaskDescription, TaskStatus,
};
use janitor_core::arn::TaskDefinitionRef;
use janitor_core::{Page, Result};
use tracing::{debug, warn};

pub struct EcsClient {
    client: Client,
}

impl EcsClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn desired_status(status: TaskStatus) -> DesiredStatus {
    match status {
        TaskStatus::Running => DesiredStatus::Running,
        TaskStatus::Stopped => DesiredStatus::Stopped,
    }
}

#[async_trait]
impl EcsApi for EcsClient {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>> {
        let output = self
            .client
            .list_clusters()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("ecs:ListClusters"))?;
        Ok(Page::new(
            output.cluster_arns().to_vec(),
            output.next_token().map(String::from),
        ))
    }

    async fn list_tasks(
        &self,
        cluster_arn: &str,
        status: TaskStatus,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .list_tasks()
            .cluster(cluster_arn)
            .desired_status(desired_status(status))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("ecs:ListTasks"))?;
        Ok(Page::new(
            output.task_arns().to_vec(),
            output.next_token().map(String::from),
        ))
    }

    async fn describe_tasks(
        &self,
        cluster_arn: &str,
        task_arns: &[String],
    ) -> Result<Vec<TaskDescription>> {
        let output = self
            .client
            .describe_tasks()
            .cluster(cluster_arn)
            .set_tasks(Some(task_arns.to_vec()))
            .send()
            .await
            .map_err(provider_error("ecs:DescribeTasks"))?;
        for failure in output.failures() {
            debug!(
                "DescribeTasks failure for {}: {}",
                failure.arn().unwrap_or_default(),
                failure.reason().unwrap_or_default()
            );
        }

        Ok(output
            .tasks()
            .iter()
            .map(|task| TaskDescription {
                task_arn: task.task_arn().unwrap_or_default().to_string(),
                task_definition_arn: task.task_definition_arn().unwrap_or_default().to_string(),
                containers: task
                    .containers()
                    .iter()
                    .map(|c| TaskContainer {
                        name: c.name().unwrap_or_default().to_string(),
                        image: c.image().map(String::from),
                        image_digest: c.image_digest().map(String::from),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn list_services(
        &self,
        cluster_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .list_services()
            .cluster(cluster_arn)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("ecs:ListServices"))?;
        Ok(Page::new(
            output.service_arns().to_vec(),
            output.next_token().map(String::from),
        ))
    }

    async fn describe_services(
        &self,
        cluster_arn: &str,
        service_arns: &[String],
    ) -> Result<Vec<ServiceDescription>> {
        let output = self
            .client
            .describe_services()
            .cluster(cluster_arn)
            .set_services(Some(service_arns.to_vec()))
            .send()
            .await
            .map_err(provider_error("ecs:DescribeServices"))?;

        Ok(output
            .services()
            .iter()
            .map(|service| ServiceDescription {
                service_name: service.service_name().unwrap_or_default().to_string(),
                deployments: service
                    .deployments()
                    .iter()
                    .map(|d| ServiceDeployment {
                        status: d.status().unwrap_or_default().to_string(),
                        task_definition_arn: d.task_definition().unwrap_or_default().to_string(),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn list_task_definition_families(
        &self,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .list_task_definition_families()
            .status(TaskDefinitionFamilyStatus::Active)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("ecs:ListTaskDefinitionFamilies"))?;
        Ok(Page::new(
            output.families().to_vec(),
            output.next_token().map(String::from),
        ))
    }

    async fn list_task_definitions(
        &self,
        family: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let output = self
            .client
            .list_task_definitions()
            .family_prefix(family)
            .sort(SortOrder::Desc)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("ecs:ListTaskDefinitions"))?;

        // familyPrefix also matches longer family names
        let arns = output
            .task_definition_arns()
            .iter()
            .filter(|arn| match TaskDefinitionRef::from_arn(arn) {
                Ok(td) => td.family == family,
                Err(e) => {
                    warn!("Ignoring task definition {}: {}", arn, e);
                    false
                }
            })
            .cloned()
            .collect();
        Ok(Page::new(arns, output.next_token().map(String::from)))
    }

    async fn task_definition_images(&self, task_definition: &str) -> Result<Vec<String>> {
        let output = self
            .client
            .describe_task_definition()
            .task_definition(task_definition)
            .send()
            .await
            .map_err(provider_error("ecs:DescribeTaskDefinition"))?;

        Ok(output
            .task_definition()
            .map(|td| {
                td.container_definitions()
                    .iter()
                    .filter_map(|c| c.image().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}
