//! genocheck engine - running integrity checks
//!
//! This crate implements the moving parts between a check definition and a
//! report:
//! - Invariant primitives (orphans, duplicates, NULLs, zero counts)
//! - Release-to-release count drift
//! - The run-scoped report aggregator
//! - The check registry and the concurrent runner

pub mod aggregator;
pub mod check;
pub mod context;
pub mod drift;
pub mod error;
pub mod primitives;
pub mod registry;
pub mod runner;

pub use aggregator::Aggregator;
pub use check::Check;
pub use context::{CheckContext, PreviousDatabase};
pub use drift::{compare_counts, CountComparison, DriftCheck, DriftVerdict, RatioDirection, ThresholdComparisonRecord};
pub use error::{CheckError, RegistryError};
pub use primitives::{counts_by_key, validate_identifier};
pub use registry::CheckRegistry;
pub use runner::{CheckRunner, DatabaseTarget, RunnerOptions};
