//! # janitor-core
//!
//! Shared building blocks for ecr-janitor:
//! - Image references and the live-reference ledger
//! - Artifact classification and retention summaries
//! - Configuration parsing and policy resolution
//! - Error taxonomy and cooperative cancellation

pub mod arn;
pub mod artifact;
pub mod cancel;
pub mod config;
pub mod error;
pub mod live;
pub mod page;
pub mod reference;
pub mod set;
pub mod summary;

pub use artifact::{ArtifactClass, ArtifactDetail};
pub use cancel::CancelToken;
pub use config::{JanitorConfig, RepositoryPolicy};
pub use error::{Error, Result};
pub use live::LiveImageTable;
pub use page::{collect_pages, Page};
pub use reference::{ImageReference, RegistryHost};
pub use set::MembershipSet;
pub use summary::{RepositorySummary, SummaryTable};
