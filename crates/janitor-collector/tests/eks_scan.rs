//! EKS scanner tests against the in-memory fake

mod common;

use camino::Utf8Path;
use chrono::Utc;
use common::{image, FakeEks, FakeKube};
use janitor_collector::eks::EksScanner;
use janitor_core::{CancelToken, ImageReference, JanitorConfig};
use serde_json::{json, Value};
use std::sync::Arc;

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

fn meta(name: &str) -> Value {
    json!({"name": name, "namespace": "default"})
}

fn status(name: &str, image: &str, image_id: &str) -> Value {
    json!({
        "name": name,
        "image": image,
        "imageID": image_id,
        "ready": true,
        "restartCount": 0
    })
}

fn template(image: &str) -> Value {
    json!({
        "metadata": {"labels": {"app": "x"}},
        "spec": {"containers": [{"name": "main", "image": image}]}
    })
}

fn revision(name: &str, owner_kind: &str, data: Option<Value>) -> Value {
    let mut rev = json!({
        "apiVersion": "apps/v1",
        "kind": "ControllerRevision",
        "metadata": {
            "name": name,
            "namespace": "default",
            "ownerReferences": [{
                "apiVersion": "apps/v1",
                "kind": owner_kind,
                "name": "owner",
                "uid": "0000"
            }]
        },
        "revision": 1
    });
    if let Some(data) = data {
        rev["data"] = data;
    }
    rev
}

fn prod_cluster() -> FakeKube {
    let registry_app = image("app");
    FakeKube {
        pods: vec![
            decode(json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": meta("app-1"),
                "status": {
                    "containerStatuses": [status(
                        "app",
                        &image("app:v1"),
                        &format!("docker-pullable://{}@sha256:1111", registry_app),
                    )],
                    "initContainerStatuses": [status("init", &image("init:v1"), "sha256:2222")]
                }
            })),
            decode(json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": meta("proxy"),
                "status": {
                    "containerStatuses": [status(
                        "nginx",
                        "nginx:latest",
                        "docker-pullable://nginx@sha256:3333",
                    )]
                }
            })),
            decode(json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": meta("pending"),
                "status": {
                    "containerStatuses": [status("app", &image("app:v9"), "")]
                }
            })),
        ],
        replica_sets: vec![decode(json!({
            "apiVersion": "apps/v1",
            "kind": "ReplicaSet",
            "metadata": meta("app-5d4f"),
            "spec": {"selector": {}, "template": template(&image("app:v2"))}
        }))],
        controller_revisions: vec![
            decode(revision(
                "db-7c9",
                "StatefulSet",
                Some(json!({"spec": {"template": template(&image("db:v3"))}})),
            )),
            decode(revision(
                "weird-1",
                "Deployment",
                Some(json!({"spec": {"template": template(&image("weird:v1"))}})),
            )),
            decode(revision("empty-1", "DaemonSet", None)),
        ],
        cron_jobs: vec![decode(json!({
            "apiVersion": "batch/v1",
            "kind": "CronJob",
            "metadata": meta("nightly"),
            "spec": {
                "schedule": "0 0 * * *",
                "jobTemplate": {"spec": {"template": template(&image("job:v4"))}}
            }
        }))],
    }
}

fn staging_cluster() -> FakeKube {
    FakeKube {
        replica_sets: vec![decode(json!({
            "apiVersion": "apps/v1",
            "kind": "ReplicaSet",
            "metadata": meta("staging"),
            "spec": {"selector": {}, "template": template(&image("staging:v1"))}
        }))],
        ..Default::default()
    }
}

fn config(yaml: &str) -> JanitorConfig {
    JanitorConfig::from_yaml(yaml, Utf8Path::new("ecr-janitor.yaml"), Utc::now()).unwrap()
}

#[tokio::test]
async fn test_scans_workloads_on_matched_clusters() {
    let mut eks = FakeEks::default();
    eks.clusters.insert("prod-k8s".to_string(), prod_cluster());
    eks.clusters.insert("staging".to_string(), staging_cluster());
    let eks = Arc::new(eks);
    let config = config("eks_clusters:\n  - name_pattern: \"prod*\"\n");

    let live = EksScanner::new(eks.clone(), CancelToken::new(), 2)
        .scan(&config.eks_clusters)
        .await
        .unwrap();

    let expected = [
        format!("{}@sha256:1111", image("app")),
        format!("{}@sha256:2222", image("init")),
        image("app:v2"),
        image("db:v3"),
        image("job:v4"),
    ];
    for reference in &expected {
        assert!(
            live.contains(&ImageReference::new(reference.as_str())),
            "{}",
            reference
        );
    }
    assert_eq!(live.len(), expected.len());

    let consumers = live
        .consumers(&ImageReference::new(image("app:v2")))
        .unwrap();
    assert!(consumers.contains("prod-k8s/replicaset/default/app-5d4f"));
    let consumers = live
        .consumers(&ImageReference::new(image("job:v4")))
        .unwrap();
    assert!(consumers.contains("prod-k8s/cronjob/default/nightly"));

    assert_eq!(eks.log.count("Connect prod-k8s"), 1);
    assert_eq!(eks.log.count("Connect staging"), 0);
}

#[tokio::test]
async fn test_unreachable_cluster_aborts_scan() {
    struct Unreachable;

    #[async_trait::async_trait]
    impl janitor_collector::EksApi for Unreachable {
        async fn list_clusters(
            &self,
            _next_token: Option<String>,
        ) -> janitor_core::Result<janitor_collector::Page<String>> {
            Ok(janitor_collector::Page::last(vec!["prod".to_string()]))
        }

        async fn connect(
            &self,
            _cluster_name: &str,
        ) -> janitor_core::Result<Arc<dyn janitor_collector::KubeApi>> {
            Err(janitor_core::Error::provider(
                "eks:DescribeCluster",
                "access denied",
            ))
        }
    }

    let config = config("eks_clusters:\n  - name: prod\n");
    let err = EksScanner::new(Arc::new(Unreachable), CancelToken::new(), 2)
        .scan(&config.eks_clusters)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("eks:DescribeCluster"));
}
