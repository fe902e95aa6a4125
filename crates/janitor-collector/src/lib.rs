//! # janitor-collector
//!
//! Determines which images are in use right now:
//! - ECS tasks, services and recent task definition revisions
//! - Lambda function versions (aliased and most recent)
//! - EKS workloads (pods, ReplicaSets, ControllerRevisions, CronJobs)
//! - External commands and exclude/prescan files

pub mod collector;
pub mod ecs;
pub mod eks;
pub mod external;
pub mod files;
pub mod lambda;
pub mod traits;
pub mod util;

pub use collector::{Collector, Platforms};
pub use files::{load_file, load_files};
pub use traits::{EcsApi, EksApi, KubeApi, LambdaApi, Page};
