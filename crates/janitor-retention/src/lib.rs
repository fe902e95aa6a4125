//! # janitor-retention
//!
//! Decides which registry artifacts expire and deletes them:
//! - Container image retention (live references, tag patterns, age, keep count)
//! - Cascade to image indexes and attached (SOCI) indexes
//! - Per-repository summaries
//! - Confirmed, batched deletion

pub mod executor;
pub mod manifest;
pub mod phases;
pub mod planner;
pub mod traits;

pub use executor::{Confirmer, DeletionReport, ExecutionMode, Executor};
pub use planner::{DeletionCandidateSet, Plan, Planner};
pub use traits::{DeleteFailure, DeleteOutcome, RegistryApi};
