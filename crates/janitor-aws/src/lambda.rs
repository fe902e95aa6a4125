//! Lambda inventory backed by the AWS SDK

use crate::error::provider_error;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_lambda::types::FunctionConfiguration;
use aws_sdk_lambda::Client;
use janitor_collector::traits::{FunctionAlias, FunctionSummary, FunctionVersion, LambdaApi};
use janitor_core::{Page, Result};

pub struct LambdaClient {
    client: Client,
}

impl LambdaClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn package_type(function: &FunctionConfiguration) -> String {
    function
        .package_type()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl LambdaApi for LambdaClient {
    async fn list_functions(&self, marker: Option<String>) -> Result<Page<FunctionSummary>> {
        let output = self
            .client
            .list_functions()
            .set_marker(marker)
            .send()
            .await
            .map_err(provider_error("lambda:ListFunctions"))?;

        let functions = output
            .functions()
            .iter()
            .map(|f| FunctionSummary {
                function_name: f.function_name().unwrap_or_default().to_string(),
                function_arn: f.function_arn().unwrap_or_default().to_string(),
                package_type: package_type(f),
            })
            .collect();
        Ok(Page::new(functions, output.next_marker().map(String::from)))
    }

    async fn list_versions(
        &self,
        function_name: &str,
        marker: Option<String>,
    ) -> Result<Page<FunctionVersion>> {
        let output = self
            .client
            .list_versions_by_function()
            .function_name(function_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(provider_error("lambda:ListVersionsByFunction"))?;

        let versions = output
            .versions()
            .iter()
            .map(|v| FunctionVersion {
                version: v.version().unwrap_or_default().to_string(),
                function_arn: v.function_arn().unwrap_or_default().to_string(),
            })
            .collect();
        Ok(Page::new(versions, output.next_marker().map(String::from)))
    }

    async fn list_aliases(
        &self,
        function_name: &str,
        marker: Option<String>,
    ) -> Result<Page<FunctionAlias>> {
        let output = self
            .client
            .list_aliases()
            .function_name(function_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(provider_error("lambda:ListAliases"))?;

        let aliases = output
            .aliases()
            .iter()
            .map(|a| {
                let mut additional_versions: Vec<String> = a
                    .routing_config()
                    .and_then(|r| r.additional_version_weights())
                    .map(|weights| weights.keys().cloned().collect())
                    .unwrap_or_default();
                additional_versions.sort();
                FunctionAlias {
                    name: a.name().unwrap_or_default().to_string(),
                    function_version: a.function_version().unwrap_or_default().to_string(),
                    additional_versions,
                }
            })
            .collect();
        Ok(Page::new(aliases, output.next_marker().map(String::from)))
    }

    async fn function_image(&self, function_arn: &str) -> Result<Option<String>> {
        let output = self
            .client
            .get_function()
            .function_name(function_arn)
            .send()
            .await
            .map_err(provider_error("lambda:GetFunction"))?;
        Ok(output
            .code()
            .and_then(|code| code.image_uri())
            .map(String::from))
    }
}
