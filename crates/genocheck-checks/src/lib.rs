//! genocheck checks - the concrete check catalog
//!
//! Every check shipped with genocheck, registered from a static list:
//! - Compara foreign keys (`ForeignKeyGenomicAlignBlockId`, `ForeignKeyMemberId`)
//! - Stable identifier validity (`StableID`)
//! - Canonical transcript consistency (`CanonicalTranscriptCoding`)
//! - Xref drift against the previous release (`ComparePreviousVersionXrefs`)

pub mod canonical_transcript;
pub mod foreign_keys;
pub mod stable_id;
pub mod xrefs;

pub use canonical_transcript::CanonicalTranscriptCheck;
pub use foreign_keys::{ForeignKeyCheck, Relation, RelationGroup, Requirement};
pub use stable_id::StableIdCheck;
pub use xrefs::XrefCounts;

use genocheck_core::Config;
use genocheck_engine::{CheckRegistry, RegistryError};

/// Registry of every shipped check, with thresholds taken from `config`
pub fn registry(config: &Config) -> Result<CheckRegistry, RegistryError> {
    let mut registry = CheckRegistry::new();

    registry.register(foreign_keys::genomic_align_block_id())?;
    registry.register(foreign_keys::member_id())?;
    registry.register(StableIdCheck::new())?;
    registry.register(CanonicalTranscriptCheck::new())?;
    registry.register(xrefs::compare_previous_version_xrefs(
        config.threshold_for(xrefs::NAME, xrefs::DEFAULT_THRESHOLD),
    ))?;

    tracing::debug!(checks = registry.len(), "check registry built");
    Ok(registry)
}
