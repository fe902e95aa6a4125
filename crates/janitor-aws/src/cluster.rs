//! Kubernetes listings backed by kube-rs

use async_trait::async_trait;
use janitor_collector::traits::KubeApi;
use janitor_core::{Error, Page, Result};
use k8s_openapi::api::apps::v1::{ControllerRevision, ReplicaSet};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Objects requested per list call
pub const LIST_LIMIT: u32 = 500;

/// Cluster-wide listings through an authenticated client
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn list<K>(&self, operation: &'static str, continue_token: Option<String>) -> Result<Page<K>>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let mut params = ListParams::default().limit(LIST_LIMIT);
        if let Some(token) = &continue_token {
            params = params.continue_token(token);
        }
        let list = api
            .list(&params)
            .await
            .map_err(|e| Error::provider(operation, e))?;
        Ok(Page::new(list.items, list.metadata.continue_))
    }
}

#[async_trait]
impl KubeApi for KubeClient {
    async fn list_pods(&self, continue_token: Option<String>) -> Result<Page<Pod>> {
        self.list("kube:ListPods", continue_token).await
    }

    async fn list_replica_sets(&self, continue_token: Option<String>) -> Result<Page<ReplicaSet>> {
        self.list("kube:ListReplicaSets", continue_token).await
    }

    async fn list_controller_revisions(
        &self,
        continue_token: Option<String>,
    ) -> Result<Page<ControllerRevision>> {
        self.list("kube:ListControllerRevisions", continue_token).await
    }

    async fn list_cron_jobs(&self, continue_token: Option<String>) -> Result<Page<CronJob>> {
        self.list("kube:ListCronJobs", continue_token).await
    }
}
