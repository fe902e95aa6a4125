//! Loading a complete configuration file from disk

use camino::Utf8PathBuf;
use chrono::{Duration, TimeZone, Utc};
use janitor_core::config::DEFAULT_KEEP_COUNT;
use janitor_core::{Error, JanitorConfig, RepositoryPolicy};
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
exclude_files:
  - keep.txt
clusters:
  - name: prod
  - name_pattern: "staging-*"
task_definitions:
  - name_pattern: "*"
    keep_count: 3
lambda_functions:
  - name: api
eks_clusters:
  - name: k8s
external_commands:
  - command: ["./list-images.sh", "--all"]
    env:
      STAGE: prod
    dir: scripts
    timeout: 1m30s
repositories:
  - name_pattern: "team/*"
    expires: 30d
    keep_count: 2
    keep_tag_patterns: ["latest", "release-*"]
  - name: legacy
    expires: 1w
max_concurrency: 8
"#;

fn write_config(content: &str) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().unwrap();
    let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    fs::write(base.join("keep.txt"), "# pinned images\n").unwrap();
    let path = base.join("ecr-janitor.yaml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_full_configuration() {
    let (_dir, path) = write_config(CONFIG);
    let base = path.parent().unwrap().to_owned();
    let config = JanitorConfig::load(&path).unwrap();

    assert_eq!(config.config_path, path);
    assert_eq!(config.exclude_files, vec![base.join("keep.txt")]);
    assert_eq!(config.max_concurrency, 8);

    assert!(config.clusters[0].matches("prod"));
    assert!(config.clusters[1].matches("staging-eu"));
    assert!(!config.clusters[1].matches("prod"));
    assert_eq!(config.task_definitions[0].keep_count, 3);
    assert_eq!(config.lambda_functions[0].keep_count, DEFAULT_KEEP_COUNT);
    assert!(config.eks_clusters[0].matches("k8s"));

    let command = &config.external_commands[0];
    assert_eq!(command.display(), "./list-images.sh --all");
    assert_eq!(command.env.get("STAGE").map(String::as_str), Some("prod"));
    assert_eq!(command.dir, Some(base.join("scripts")));
    assert_eq!(command.timeout, Some(std::time::Duration::from_secs(90)));
}

#[test]
fn test_repository_policies_resolve_against_now() {
    let (_dir, path) = write_config(CONFIG);
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let config = JanitorConfig::from_yaml(CONFIG, &path, now).unwrap();

    let team = RepositoryPolicy::first_match(&config.repositories, "team/api").unwrap();
    assert_eq!(team.cutoff, now - Duration::days(30));
    assert_eq!(team.keep_count, 2);
    assert!(team.matches_tag("release-1.2"));
    assert!(!team.matches_tag("feature-x"));
    assert!(team.is_expired(now - Duration::days(31)));
    assert!(!team.is_expired(now - Duration::days(29)));

    let legacy = RepositoryPolicy::first_match(&config.repositories, "legacy").unwrap();
    assert_eq!(legacy.cutoff, now - Duration::weeks(1));
    assert_eq!(legacy.keep_count, 0);
    assert_eq!(legacy.keep_tag_patterns, vec!["latest"]);

    assert!(RepositoryPolicy::first_match(&config.repositories, "other").is_none());
}

#[test]
fn test_name_and_pattern_are_exclusive() {
    let (_dir, path) = write_config("clusters:\n  - name: prod\n    name_pattern: \"p*\"\n");
    let err = JanitorConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_unknown_fields_are_rejected() {
    let (_dir, path) = write_config("repositoriez: []\n");
    let err = JanitorConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Yaml(_)));
}

#[test]
fn test_missing_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(dir.path().join("absent.yaml")).unwrap();
    let err = JanitorConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("configuration file not found"));
}
