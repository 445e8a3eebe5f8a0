//! genocheck core
//!
//! Domain model shared by every crate: database identities, check metadata,
//! severity levels, report entries and the versioned report format.
//! Never rename finding codes - they are part of the report format.

pub mod catalog;
pub mod config;
pub mod finding;
pub mod identity;
pub mod metadata;
pub mod report;

pub use catalog::{MetadataCatalog, PrefixRule, StandardCatalog};
pub use config::{Config, ConfigError, DatabaseConfig};
pub use finding::{FindingCode, ReportEntry, Severity};
pub use identity::{DatabaseIdentity, DatabaseKind, IdentityError, Species};
pub use metadata::{applies, CheckMetadata, CheckMetadataBuilder, GroupSelection, Priority, Team};
pub use report::{CheckOutcome, CheckStatus, Report, ReportSummary, ReportVersion};
