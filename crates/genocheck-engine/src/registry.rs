//! Explicit check registry

use crate::check::Check;
use crate::error::RegistryError;
use genocheck_core::{applies, DatabaseIdentity, GroupSelection};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Checks by name, built once at startup
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: BTreeMap<String, Arc<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check; names must be unique
    pub fn register<C: Check + 'static>(&mut self, check: C) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(check))
    }

    pub fn register_arc(&mut self, check: Arc<dyn Check>) -> Result<(), RegistryError> {
        let name = check.metadata().name().to_string();
        if self.checks.contains_key(&name) {
            return Err(RegistryError::DuplicateCheck(name));
        }
        self.checks.insert(name, check);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Check>> {
        self.checks.get(name)
    }

    /// All checks in name order
    pub fn checks(&self) -> impl Iterator<Item = &Arc<dyn Check>> {
        self.checks.values()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Checks belonging to at least one selected group
    pub fn in_groups<'a>(&'a self, selection: &'a GroupSelection) -> impl Iterator<Item = &'a Arc<dyn Check>> {
        self.checks
            .values()
            .filter(move |check| check.metadata().groups().iter().any(|g| selection.contains(g)))
    }

    /// Checks that should run against `db` for the selection
    pub fn applicable(&self, db: &DatabaseIdentity, selection: &GroupSelection) -> Vec<Arc<dyn Check>> {
        self.checks
            .values()
            .filter(|check| applies(check.metadata(), db, selection))
            .cloned()
            .collect()
    }

    /// Every group with the number of checks in it (check names included)
    pub fn groups(&self) -> BTreeMap<String, usize> {
        let mut groups = BTreeMap::new();
        for check in self.checks.values() {
            for group in check.metadata().groups() {
                *groups.entry(group.clone()).or_insert(0) += 1;
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CheckContext;
    use crate::error::CheckError;
    use genocheck_core::{CheckMetadata, DatabaseKind, Species};

    struct Named(CheckMetadata);

    #[async_trait::async_trait]
    impl Check for Named {
        fn metadata(&self) -> &CheckMetadata {
            &self.0
        }

        async fn run(&self, _ctx: &mut CheckContext) -> Result<bool, CheckError> {
            Ok(true)
        }
    }

    fn named(name: &str, group: &str, kinds: &[DatabaseKind]) -> Named {
        Named(
            CheckMetadata::builder(name)
                .group(group)
                .only_kinds(kinds.iter().copied())
                .build(),
        )
    }

    #[test]
    fn rejects_duplicates() {
        let mut registry = CheckRegistry::new();
        registry.register(named("A", "release", &[DatabaseKind::Core])).unwrap();
        assert_eq!(
            registry.register(named("A", "other", &[DatabaseKind::Core])),
            Err(RegistryError::DuplicateCheck("A".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn applicability_and_groups() {
        let mut registry = CheckRegistry::new();
        registry.register(named("CoreCheck", "release", &[DatabaseKind::Core])).unwrap();
        registry.register(named("ComparaCheck", "release", &[DatabaseKind::Compara])).unwrap();
        registry.register(named("Xrefs", "core_xrefs", &[DatabaseKind::Core])).unwrap();

        let core = DatabaseIdentity::new("homo_sapiens_core_110_38", Species::HomoSapiens, DatabaseKind::Core, 110);
        let release = GroupSelection::new(["release"]);

        let names: Vec<_> = registry
            .applicable(&core, &release)
            .iter()
            .map(|c| c.metadata().name().to_string())
            .collect();
        assert_eq!(names, vec!["CoreCheck".to_string()]);

        assert_eq!(registry.in_groups(&release).count(), 2);

        let groups = registry.groups();
        assert_eq!(groups["release"], 2);
        assert_eq!(groups["core_xrefs"], 1);
        assert_eq!(groups["Xrefs"], 1);
    }
}
