//! Metadata catalog: database names to identities, species to ID prefixes

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::identity::{DatabaseIdentity, DatabaseKind, IdentityError, Species};

/// Expected stable identifier prefix for a species
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixRule {
    /// Identifiers must start with this prefix (e.g. `ENSMUS`)
    Prefix(String),

    /// Species does not use prefixed identifiers; skip prefix checks
    Ignore,
}

impl PrefixRule {
    /// Parse a configured value; `IGNORE` (any case) disables the check
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("ignore") {
            Self::Ignore
        } else {
            Self::Prefix(value.trim().to_string())
        }
    }
}

/// Read-only lookups consumed by species-aware checks
pub trait MetadataCatalog: Send + Sync {
    /// Resolve a database name to its identity
    fn resolve(&self, name: &str) -> Result<DatabaseIdentity, IdentityError>;

    /// Expected stable ID prefix, or `None` when nothing is registered
    fn stable_id_prefix(&self, species: Species, kind: DatabaseKind) -> Option<PrefixRule>;
}

/// Catalog built on the release naming convention
///
/// Recognised names:
/// - `<genus>_<species>_<kind>_<release>_<assembly>` (e.g. `homo_sapiens_core_110_38`)
/// - `ensembl_compara_<release>`
/// - `ensembl_<kind>_<release>` (ontology, production)
#[derive(Debug, Clone, Default)]
pub struct StandardCatalog {
    prefix_overrides: HashMap<Species, PrefixRule>,
}

fn species_db_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<species>[a-z]+_[a-z]+(?:_[a-z0-9]+)?)_(?P<kind>core|cdna|otherfeatures|rnaseq|vega|variation|funcgen)_(?P<release>\d+)_(?P<assembly>[a-z0-9]+)$",
        )
        .expect("species database pattern is valid")
    })
}

fn multi_species_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^ensembl_(?:[a-z]+_)?(?P<kind>compara|ontology|production)_(?P<release>\d+)$")
            .expect("multi-species database pattern is valid")
    })
}

impl StandardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override (or add) the prefix rule for a species
    pub fn with_prefix(mut self, species: Species, rule: PrefixRule) -> Self {
        self.prefix_overrides.insert(species, rule);
        self
    }

    fn builtin_prefix(species: Species) -> Option<PrefixRule> {
        let prefix = match species {
            Species::HomoSapiens => "ENS",
            Species::MusMusculus => "ENSMUS",
            Species::RattusNorvegicus => "ENSRNO",
            Species::DanioRerio => "ENSDAR",
            Species::GallusGallus => "ENSGAL",
            Species::BosTaurus => "ENSBTA",
            Species::SusScrofa => "ENSSSC",
            Species::CanisFamiliaris => "ENSCAF",
            Species::PanTroglodytes => "ENSPTR",
            // ID mapping is not done for these species
            Species::CaenorhabditisElegans
            | Species::DrosophilaMelanogaster
            | Species::SaccharomycesCerevisiae
            | Species::AnophelesGambiae => return Some(PrefixRule::Ignore),
            Species::Unknown => return None,
        };
        Some(PrefixRule::Prefix(prefix.to_string()))
    }
}

impl MetadataCatalog for StandardCatalog {
    fn resolve(&self, name: &str) -> Result<DatabaseIdentity, IdentityError> {
        if let Some(caps) = species_db_pattern().captures(name) {
            let species = Species::from_name(&caps["species"]);
            let kind: DatabaseKind = caps["kind"].parse()?;
            let release = caps["release"]
                .parse()
                .map_err(|_| IdentityError::UnresolvableName(name.to_string()))?;
            return Ok(DatabaseIdentity::new(name, species, kind, release));
        }

        if let Some(caps) = multi_species_pattern().captures(name) {
            let kind: DatabaseKind = caps["kind"].parse()?;
            let release = caps["release"]
                .parse()
                .map_err(|_| IdentityError::UnresolvableName(name.to_string()))?;
            return Ok(DatabaseIdentity::new(name, Species::Unknown, kind, release));
        }

        Err(IdentityError::UnresolvableName(name.to_string()))
    }

    fn stable_id_prefix(&self, species: Species, kind: DatabaseKind) -> Option<PrefixRule> {
        // Only core-like databases carry species-prefixed identifiers
        if !kind.is_generic() {
            return None;
        }

        self.prefix_overrides
            .get(&species)
            .cloned()
            .or_else(|| Self::builtin_prefix(species))
    }
}
