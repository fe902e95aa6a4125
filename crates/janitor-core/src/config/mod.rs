//! Configuration loading and policy resolution

mod duration;
mod file;
mod loader;
mod policy;

pub use duration::parse_duration;
pub use file::{ConfigFile, CountedSelector, ExternalCommandFile, NameSelector, RepositoryFile};
pub use loader::{JanitorConfig, DEFAULT_CONFIG_FILE, DEFAULT_MAX_CONCURRENCY};
pub use policy::{
    resolve_path, ClusterPolicy, EksClusterPolicy, ExternalCommand, LambdaPolicy, NameMatcher,
    RepositoryPolicy, TaskDefinitionPolicy, DEFAULT_KEEP_COUNT, DEFAULT_KEEP_TAG_PATTERNS,
};
