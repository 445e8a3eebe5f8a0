//! Xref counts per external database against the previous release

use genocheck_core::{CheckMetadata, DatabaseIdentity, DatabaseKind};
use genocheck_engine::{CountComparison, DriftCheck};

pub const NAME: &str = "ComparePreviousVersionXrefs";

/// Lowest acceptable `current / previous` ratio per external database
pub const DEFAULT_THRESHOLD: f64 = 0.78;

/// Last schema version that marked projected xrefs in the display label
const LABELLED_PROJECTION_SCHEMA: u32 = 37;

pub struct XrefCounts {
    metadata: CheckMetadata,
    threshold: f64,
}

impl XrefCounts {
    pub fn new(threshold: f64) -> Self {
        Self {
            metadata: CheckMetadata::builder(NAME)
                .description("Compare the xrefs in the current database with those from the previous release")
                .group("release")
                .group("core_xrefs")
                .only_kinds(DatabaseKind::ALL.into_iter().filter(|kind| kind.is_generic()))
                .build(),
            threshold,
        }
    }

    /// Projected xrefs are left out of the counts
    fn exclude_projected(db: &DatabaseIdentity) -> &'static str {
        if db.schema_version() <= LABELLED_PROJECTION_SCHEMA {
            " AND x.display_label NOT LIKE '%[from%'"
        } else {
            " AND x.info_type IS NULL"
        }
    }
}

impl CountComparison for XrefCounts {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn subject(&self) -> &str {
        "xrefs"
    }

    fn counts_sql(&self, db: &DatabaseIdentity) -> String {
        format!(
            "SELECT e.db_name, COUNT(*) FROM external_db e, xref x, object_xref ox \
             WHERE e.external_db_id=x.external_db_id AND x.xref_id=ox.xref_id{} \
             GROUP BY e.db_name",
            Self::exclude_projected(db)
        )
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

pub fn compare_previous_version_xrefs(threshold: f64) -> DriftCheck<XrefCounts> {
    DriftCheck::new(XrefCounts::new(threshold))
}
