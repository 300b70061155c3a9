pub mod classify;
pub mod clone_cache;
pub mod runner;

pub use classify::{classify_changes, ChangeClassification, DiffMode, FileImpact};
pub use clone_cache::{
    build_cache_key, CloneCache, CloneCacheConfig, CloneCredentials, CloneOutcome,
};
pub use runner::{run_git_in, GitRunner, CLONE_TIMEOUT, PLUMBING_TIMEOUT};
