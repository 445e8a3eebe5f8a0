//! Check metadata and applicability

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::identity::{DatabaseIdentity, DatabaseKind, Species};

/// Team responsible for a check and its findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Core,
    Genebuild,
    Compara,
    Variation,
    Funcgen,
    Production,
    ReleaseCoordinator,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Genebuild => "genebuild",
            Self::Compara => "compara",
            Self::Variation => "variation",
            Self::Funcgen => "funcgen",
            Self::Production => "production",
            Self::ReleaseCoordinator => "release_coordinator",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How costly it is to ignore a failing check
///
/// Independent of report severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Green,
    Amber,
    Red,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Amber
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Amber => write!(f, "amber"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// Immutable description of a check
///
/// Built once through [`CheckMetadata::builder`]. Every check is also a
/// member of a group named after itself, so a single check can be selected
/// by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMetadata {
    name: String,
    description: String,
    groups: BTreeSet<String>,
    teams: Vec<Team>,
    priority: Priority,
    applies_to: BTreeSet<DatabaseKind>,
    species: Option<BTreeSet<Species>>,
    effect: Option<String>,
    fix: Option<String>,
}

impl CheckMetadata {
    /// Start building metadata for the named check
    pub fn builder(name: impl Into<String>) -> CheckMetadataBuilder {
        CheckMetadataBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// All responsible teams, primary first
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// The team findings are attributed to
    pub fn primary_team(&self) -> Option<Team> {
        self.teams.first().copied()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn applicable_kinds(&self) -> &BTreeSet<DatabaseKind> {
        &self.applies_to
    }

    pub fn applicable_species(&self) -> Option<&BTreeSet<Species>> {
        self.species.as_ref()
    }

    /// What breaks downstream if this check fails
    pub fn effect(&self) -> Option<&str> {
        self.effect.as_deref()
    }

    /// Remediation text
    pub fn fix(&self) -> Option<&str> {
        self.fix.as_deref()
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Whether this check may run against a database of the given kind/species
    pub fn applies_to_database(&self, db: &DatabaseIdentity) -> bool {
        if !self.applies_to.contains(&db.kind()) {
            return false;
        }

        match &self.species {
            Some(species) => species.contains(&db.species()),
            None => true,
        }
    }
}

/// Builder for [`CheckMetadata`]
///
/// Applicable kinds start at "all" and can only be narrowed.
#[derive(Debug, Clone)]
pub struct CheckMetadataBuilder {
    name: String,
    description: String,
    groups: BTreeSet<String>,
    teams: Vec<Team>,
    priority: Priority,
    applies_to: BTreeSet<DatabaseKind>,
    species: Option<BTreeSet<Species>>,
    effect: Option<String>,
    fix: Option<String>,
}

impl CheckMetadataBuilder {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut groups = BTreeSet::new();
        groups.insert(name.clone());

        Self {
            name,
            description: String::new(),
            groups,
            teams: Vec::new(),
            priority: Priority::default(),
            applies_to: DatabaseKind::ALL.into_iter().collect(),
            species: None,
            effect: None,
            fix: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add the check to a named group
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    /// Add a responsible team (the first one added is the primary team)
    pub fn team(mut self, team: Team) -> Self {
        if !self.teams.contains(&team) {
            self.teams.push(team);
        }
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Stop the check from applying to one kind of database
    pub fn without_kind(mut self, kind: DatabaseKind) -> Self {
        self.applies_to.remove(&kind);
        self
    }

    /// Narrow applicability to the given kinds (intersection)
    pub fn only_kinds(mut self, kinds: impl IntoIterator<Item = DatabaseKind>) -> Self {
        let wanted: BTreeSet<DatabaseKind> = kinds.into_iter().collect();
        self.applies_to.retain(|kind| wanted.contains(kind));
        self
    }

    /// Narrow applicability to the given species (intersection)
    pub fn only_species(mut self, species: impl IntoIterator<Item = Species>) -> Self {
        let wanted: BTreeSet<Species> = species.into_iter().collect();
        self.species = Some(match self.species.take() {
            Some(current) => current.intersection(&wanted).copied().collect(),
            None => wanted,
        });
        self
    }

    pub fn effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = Some(effect.into());
        self
    }

    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn build(self) -> CheckMetadata {
        CheckMetadata {
            name: self.name,
            description: self.description,
            groups: self.groups,
            teams: self.teams,
            priority: self.priority,
            applies_to: self.applies_to,
            species: self.species,
            effect: self.effect,
            fix: self.fix,
        }
    }
}

/// Set of groups selected for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSelection {
    groups: BTreeSet<String>,
}

impl GroupSelection {
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Whether `check` should run against `db` for the selected groups
///
/// True iff the database kind (and species, when restricted) is applicable
/// and at least one of the check's groups is selected.
pub fn applies(check: &CheckMetadata, db: &DatabaseIdentity, selection: &GroupSelection) -> bool {
    check.applies_to_database(db)
        && check.groups.iter().any(|group| selection.contains(group))
}
