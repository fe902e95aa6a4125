//! EKS control plane and cluster authentication

use crate::cluster::KubeClient;
use crate::error::provider_error;
use crate::token::cluster_token;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_eks::Client;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use janitor_collector::traits::{EksApi, KubeApi};
use janitor_core::{Error, Page, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::debug;

pub struct EksClient {
    client: Client,
    config: SdkConfig,
}

impl EksClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
            config: config.clone(),
        }
    }
}

const DESCRIBE_CLUSTER: &str = "eks:DescribeCluster";

fn incomplete_cluster(cluster_name: &str, message: impl std::fmt::Display) -> Error {
    Error::provider(DESCRIBE_CLUSTER, format!("{}: {}", cluster_name, message))
}

/// DER certificates from a PEM bundle
///
/// Non-certificate blocks (keys, EC parameters) are ignored.
pub fn pem_certificates(pem: &str) -> Result<Vec<Vec<u8>>> {
    let certificates = rustls_pemfile::certs(&mut pem.as_bytes())
        .map(|cert| cert.map(|der| der.as_ref().to_vec()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::provider(DESCRIBE_CLUSTER, e))?;
    if certificates.is_empty() {
        return Err(Error::provider(
            DESCRIBE_CLUSTER,
            "no certificates found in certificate authority",
        ));
    }
    Ok(certificates)
}

/// Decode the base64 PEM bundle EKS reports for a cluster
pub fn cluster_certificates(data: &str) -> Result<Vec<Vec<u8>>> {
    let pem = STANDARD
        .decode(data.trim())
        .map_err(|e| Error::provider(DESCRIBE_CLUSTER, e))?;
    let pem = String::from_utf8(pem).map_err(|e| Error::provider(DESCRIBE_CLUSTER, e))?;
    pem_certificates(&pem)
}

#[async_trait]
impl EksApi for EksClient {
    async fn list_clusters(&self, next_token: Option<String>) -> Result<Page<String>> {
        let output = self
            .client
            .list_clusters()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(provider_error("eks:ListClusters"))?;
        Ok(Page::new(
            output.clusters().to_vec(),
            output.next_token().map(String::from),
        ))
    }

    async fn connect(&self, cluster_name: &str) -> Result<Arc<dyn KubeApi>> {
        let output = self
            .client
            .describe_cluster()
            .name(cluster_name)
            .send()
            .await
            .map_err(provider_error(DESCRIBE_CLUSTER))?;
        let cluster = output
            .cluster()
            .ok_or_else(|| incomplete_cluster(cluster_name, "no cluster returned"))?;
        let endpoint = cluster
            .endpoint()
            .ok_or_else(|| incomplete_cluster(cluster_name, "cluster has no endpoint"))?;
        let ca = cluster
            .certificate_authority()
            .and_then(|ca| ca.data())
            .ok_or_else(|| incomplete_cluster(cluster_name, "cluster has no certificate authority"))?;

        let credentials = self
            .config
            .credentials_provider()
            .ok_or_else(|| Error::configuration("no AWS credentials provider configured"))?;
        let region = self
            .config
            .region()
            .ok_or_else(|| Error::configuration("no AWS region configured"))?;
        let token = cluster_token(&credentials, region.as_ref(), cluster_name).await?;

        let uri: http::Uri = endpoint.parse().map_err(|e| {
            incomplete_cluster(cluster_name, format!("invalid endpoint {}: {}", endpoint, e))
        })?;
        let mut config = kube::Config::new(uri);
        config.root_cert = Some(cluster_certificates(ca)?);
        config.auth_info.token = Some(SecretString::from(token));

        let client =
            kube::Client::try_from(config).map_err(|e| Error::provider("kube:Connect", e))?;
        debug!("Connected to EKS cluster {} at {}", cluster_name, endpoint);
        Ok(Arc::new(KubeClient::new(client)))
    }
}
