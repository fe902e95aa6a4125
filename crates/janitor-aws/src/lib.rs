//! # janitor-aws
//!
//! AWS SDK and Kubernetes implementations of the janitor API seams:
//! - ECR registry listing, manifest retrieval and batch deletion
//! - ECS and Lambda inventories
//! - EKS cluster discovery and authenticated Kubernetes clients

pub mod clients;
pub mod cluster;
pub mod ecr;
pub mod ecs;
pub mod eks;
mod error;
pub mod lambda;
pub mod token;

pub use clients::AwsClients;
pub use cluster::KubeClient;
pub use ecr::EcrRegistry;
pub use ecs::EcsClient;
pub use eks::EksClient;
pub use lambda::LambdaClient;
