//! Database identity types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of annotation database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Core,
    Cdna,
    Otherfeatures,
    Rnaseq,
    Vega,
    Compara,
    Variation,
    Funcgen,
    Ontology,
    Production,
    Unknown,
}

impl DatabaseKind {
    /// Every kind, in declaration order
    pub const ALL: [DatabaseKind; 11] = [
        Self::Core,
        Self::Cdna,
        Self::Otherfeatures,
        Self::Rnaseq,
        Self::Vega,
        Self::Compara,
        Self::Variation,
        Self::Funcgen,
        Self::Ontology,
        Self::Production,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Cdna => "cdna",
            Self::Otherfeatures => "otherfeatures",
            Self::Rnaseq => "rnaseq",
            Self::Vega => "vega",
            Self::Compara => "compara",
            Self::Variation => "variation",
            Self::Funcgen => "funcgen",
            Self::Ontology => "ontology",
            Self::Production => "production",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds that share the gene/transcript/translation schema
    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            Self::Core | Self::Cdna | Self::Otherfeatures | Self::Rnaseq | Self::Vega
        )
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DatabaseKind {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| IdentityError::UnknownKind(s.to_string()))
    }
}

/// Species an annotation database describes
///
/// Multi-species databases (compara, ontology, production) and species
/// not listed here resolve to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    HomoSapiens,
    MusMusculus,
    RattusNorvegicus,
    DanioRerio,
    GallusGallus,
    BosTaurus,
    SusScrofa,
    CanisFamiliaris,
    PanTroglodytes,
    CaenorhabditisElegans,
    DrosophilaMelanogaster,
    SaccharomycesCerevisiae,
    AnophelesGambiae,
    Unknown,
}

impl Species {
    pub const ALL: [Species; 14] = [
        Self::HomoSapiens,
        Self::MusMusculus,
        Self::RattusNorvegicus,
        Self::DanioRerio,
        Self::GallusGallus,
        Self::BosTaurus,
        Self::SusScrofa,
        Self::CanisFamiliaris,
        Self::PanTroglodytes,
        Self::CaenorhabditisElegans,
        Self::DrosophilaMelanogaster,
        Self::SaccharomycesCerevisiae,
        Self::AnophelesGambiae,
        Self::Unknown,
    ];

    /// Binomial name as used in database names (e.g. `homo_sapiens`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HomoSapiens => "homo_sapiens",
            Self::MusMusculus => "mus_musculus",
            Self::RattusNorvegicus => "rattus_norvegicus",
            Self::DanioRerio => "danio_rerio",
            Self::GallusGallus => "gallus_gallus",
            Self::BosTaurus => "bos_taurus",
            Self::SusScrofa => "sus_scrofa",
            Self::CanisFamiliaris => "canis_familiaris",
            Self::PanTroglodytes => "pan_troglodytes",
            Self::CaenorhabditisElegans => "caenorhabditis_elegans",
            Self::DrosophilaMelanogaster => "drosophila_melanogaster",
            Self::SaccharomycesCerevisiae => "saccharomyces_cerevisiae",
            Self::AnophelesGambiae => "anopheles_gambiae",
            Self::Unknown => "unknown",
        }
    }

    /// Resolve a binomial name; anything unrecognised is `Unknown`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|species| species.as_str() == name)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of one database instance under test
///
/// Resolved once when the database is registered and never mutated
/// afterwards; fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseIdentity {
    name: String,
    species: Species,
    kind: DatabaseKind,
    schema_version: u32,
}

impl DatabaseIdentity {
    pub fn new(
        name: impl Into<String>,
        species: Species,
        kind: DatabaseKind,
        schema_version: u32,
    ) -> Self {
        Self {
            name: name.into(),
            species,
            kind,
            schema_version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl fmt::Display for DatabaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Errors resolving identity fields
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Unknown database kind: {0}")]
    UnknownKind(String),

    #[error("Cannot resolve database name: {0}")]
    UnresolvableName(String),
}
