//! Lambda function scanner

use crate::traits::{FunctionAlias, FunctionVersion, LambdaApi};
use crate::util::{collect_pages, for_each_bounded};
use janitor_core::config::LambdaPolicy;
use janitor_core::{CancelToken, ImageReference, LiveImageTable, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Package type of container-image functions
pub const PACKAGE_TYPE_IMAGE: &str = "Image";

const LATEST_VERSION: &str = "$LATEST";

/// Finds images used by aliased and recent Lambda function versions
pub struct LambdaScanner {
    api: Arc<dyn LambdaApi>,
    cancel: CancelToken,
    max_concurrency: usize,
}

impl LambdaScanner {
    pub fn new(api: Arc<dyn LambdaApi>, cancel: CancelToken, max_concurrency: usize) -> Self {
        Self {
            api,
            cancel,
            max_concurrency,
        }
    }

    pub async fn scan(&self, policies: &[LambdaPolicy]) -> Result<LiveImageTable> {
        if policies.is_empty() {
            debug!("No Lambda functions configured, skipping Lambda scan");
            return Ok(LiveImageTable::new());
        }
        let api = self.api.as_ref();
        let functions = collect_pages(&self.cancel, |m| api.list_functions(m)).await?;

        let matched: Vec<(String, u64)> = functions
            .into_iter()
            .filter(|f| {
                debug!(
                    "Lambda function {} package type {}",
                    f.function_name, f.package_type
                );
                f.package_type == PACKAGE_TYPE_IMAGE
            })
            .filter_map(|f| {
                policies
                    .iter()
                    .find(|p| p.matches(&f.function_name))
                    .map(|p| (f.function_name, p.keep_count))
            })
            .collect();

        let tables = for_each_bounded(matched, self.max_concurrency, |(name, keep_count)| async move {
            self.scan_function(&name, keep_count).await
        })
        .await?;

        let mut live = LiveImageTable::new();
        for table in tables {
            live.merge(table);
        }
        Ok(live)
    }

    async fn scan_function(&self, name: &str, keep_count: u64) -> Result<LiveImageTable> {
        let api = self.api.as_ref();
        debug!("Checking Lambda function {} latest {} versions", name, keep_count);

        let aliases = collect_pages(&self.cancel, |m| api.list_aliases(name, m)).await?;
        let aliases = aliases_by_version(&aliases);
        let versions = collect_pages(&self.cancel, |m| api.list_versions(name, m)).await?;

        let mut live = LiveImageTable::new();
        for version in select_versions(versions, &aliases, keep_count) {
            self.cancel.check()?;
            debug!("Getting Lambda function {}", version.function_arn);
            let Some(image) = api.function_image(&version.function_arn).await? else {
                continue;
            };
            if image.is_empty() {
                continue;
            }
            let reference = ImageReference::new(image);
            if live.add(reference.clone(), version.function_arn.clone()) {
                match aliases.get(&version.version) {
                    Some(names) => info!(
                        "Image {} is in use by Lambda function {} aliases:{:?}",
                        reference, version.function_arn, names
                    ),
                    None => info!(
                        "Image {} is in use by Lambda function {}",
                        reference, version.function_arn
                    ),
                }
            }
        }
        Ok(live)
    }
}

/// Version → alias names, including weighted routing targets
pub fn aliases_by_version(aliases: &[FunctionAlias]) -> BTreeMap<String, Vec<String>> {
    let mut by_version: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for alias in aliases {
        by_version
            .entry(alias.function_version.clone())
            .or_default()
            .push(alias.name.clone());
        for version in &alias.additional_versions {
            by_version
                .entry(version.clone())
                .or_default()
                .push(alias.name.clone());
        }
    }
    by_version
}

/// Ordering key of a version: `$LATEST` is newest, unparseable sorts oldest
pub fn version_number(version: &str) -> u64 {
    if version == LATEST_VERSION {
        return u64::MAX;
    }
    version.parse().unwrap_or_else(|e| {
        warn!("Invalid Lambda version number {:?}: {}", version, e);
        0
    })
}

/// Every aliased version plus the `keep_count` newest unaliased ones
pub fn select_versions(
    mut versions: Vec<FunctionVersion>,
    aliases: &BTreeMap<String, Vec<String>>,
    keep_count: u64,
) -> Vec<FunctionVersion> {
    versions.sort_by_cached_key(|v| std::cmp::Reverse(version_number(&v.version)));
    let mut kept = 0;
    versions
        .into_iter()
        .filter(|v| {
            if aliases.contains_key(&v.version) {
                return true;
            }
            kept += 1;
            kept <= keep_count
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(v: &str) -> FunctionVersion {
        FunctionVersion {
            version: v.to_string(),
            function_arn: format!("arn:aws:lambda:us-east-1:123456789012:function:app:{}", v),
        }
    }

    fn versions(vs: &[&str]) -> Vec<String> {
        vs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aliases_include_weighted_routing() {
        let aliases = aliases_by_version(&[
            FunctionAlias {
                name: "live".into(),
                function_version: "3".into(),
                additional_versions: vec!["2".into()],
            },
            FunctionAlias {
                name: "canary".into(),
                function_version: "3".into(),
                additional_versions: vec![],
            },
        ]);
        assert_eq!(aliases["3"], vec!["live", "canary"]);
        assert_eq!(aliases["2"], vec!["live"]);
    }

    #[test]
    fn test_version_number_ordering() {
        assert_eq!(version_number("$LATEST"), u64::MAX);
        assert_eq!(version_number("12"), 12);
        assert_eq!(version_number("garbage"), 0);
    }

    #[test]
    fn test_select_versions_keeps_aliases_and_newest() {
        let aliases = aliases_by_version(&[FunctionAlias {
            name: "prod".into(),
            function_version: "1".into(),
            additional_versions: vec![],
        }]);
        let all = ["1", "2", "3", "4", "$LATEST"].map(version).to_vec();

        let selected: Vec<String> = select_versions(all, &aliases, 2)
            .into_iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(selected, versions(&["$LATEST", "4", "1"]));
    }

    #[test]
    fn test_select_versions_zero_keep_count() {
        let aliases = BTreeMap::new();
        let all = ["1", "2"].map(version).to_vec();
        assert!(select_versions(all, &aliases, 0).is_empty());
    }
}
