//! Plugin registry: the build-once, read-only artifact catalog.
//!
//! Plugins register through an explicit capability contract: each plugin
//! module exports `pub fn artifacts() -> Vec<ArtifactSpec>`, and the
//! registry is loaded from the collected module table. There is no
//! reflection or dynamic discovery; what the table names is what runs.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::debug;

use crate::errors::TriageError;
use crate::models::ArtifactSpec;

/// One registration unit: a plugin module's origin path plus its
/// descriptor collection. A module registering zero artifacts is legal
/// and contributes nothing.
#[derive(Debug, Clone)]
pub struct PluginModule {
    /// Source path of the module, recorded per catalog entry so a
    /// duplicate name can be attributed to the module that caused it.
    pub path: &'static str,
    pub artifacts: fn() -> Vec<ArtifactSpec>,
}

/// A catalog entry: the descriptor plus the module it came from.
#[derive(Debug, Clone)]
pub struct RegisteredArtifact {
    pub spec: ArtifactSpec,
    pub origin: &'static str,
}

/// The artifact catalog. Built once at startup, read-only afterward.
///
/// Invariant: no two entries share a name. A violation aborts loading;
/// the process must not run with an ambiguous catalog.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    artifacts: BTreeMap<String, RegisteredArtifact>,
}

impl PluginRegistry {
    /// Collect every module's descriptors into a catalog.
    pub fn load(modules: &[PluginModule]) -> Result<Self, TriageError> {
        let mut artifacts: BTreeMap<String, RegisteredArtifact> = BTreeMap::new();

        for module in modules {
            let specs = (module.artifacts)();
            if specs.is_empty() {
                debug!("Plugin module {} registers no artifacts", module.path);
                continue;
            }

            for spec in specs {
                match artifacts.entry(spec.name.to_string()) {
                    Entry::Occupied(_) => {
                        return Err(TriageError::DuplicateArtifactName {
                            name: spec.name.to_string(),
                            origin: module.path.to_string(),
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(RegisteredArtifact {
                            spec,
                            origin: module.path,
                        });
                    }
                }
            }
        }

        Ok(Self { artifacts })
    }

    /// Look up a single artifact by name.
    pub fn get(&self, name: &str) -> Result<&RegisteredArtifact, TriageError> {
        self.artifacts
            .get(name)
            .ok_or_else(|| TriageError::UnknownArtifact(name.to_string()))
    }

    /// All catalog entries, ordered by artifact name.
    pub fn all(&self) -> impl Iterator<Item = &RegisteredArtifact> {
        self.artifacts.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.artifacts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtifactResult, PluginLog, ReportPresentation};
    use crate::profile::BrowserProfile;
    use crate::storage::ArtifactStorage;

    fn noop_extract(
        _profile: &dyn BrowserProfile,
        _log: &PluginLog,
        _storage: &mut ArtifactStorage,
    ) -> anyhow::Result<ArtifactResult> {
        Ok(ArtifactResult::new())
    }

    fn spec(service: &'static str, name: &'static str) -> ArtifactSpec {
        ArtifactSpec {
            service,
            name,
            description: "test artifact",
            version: "0.1",
            extract: noop_extract,
            presentation: ReportPresentation::Table,
        }
    }

    fn module_a() -> Vec<ArtifactSpec> {
        vec![spec("Alpha", "Alpha one"), spec("Alpha", "Alpha two")]
    }

    fn module_b() -> Vec<ArtifactSpec> {
        vec![spec("Beta", "Beta one")]
    }

    fn module_empty() -> Vec<ArtifactSpec> {
        Vec::new()
    }

    fn module_dup() -> Vec<ArtifactSpec> {
        vec![spec("Gamma", "Alpha one")]
    }

    #[test]
    fn test_load_collects_all_descriptors() {
        let modules = [
            PluginModule {
                path: "plugins/a.rs",
                artifacts: module_a,
            },
            PluginModule {
                path: "plugins/b.rs",
                artifacts: module_b,
            },
        ];

        let registry = PluginRegistry::load(&modules).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("Alpha one"));
        assert!(registry.contains("Beta one"));
    }

    #[test]
    fn test_empty_module_contributes_nothing() {
        let modules = [
            PluginModule {
                path: "plugins/empty.rs",
                artifacts: module_empty,
            },
            PluginModule {
                path: "plugins/b.rs",
                artifacts: module_b,
            },
        ];

        let registry = PluginRegistry::load(&modules).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_across_modules_fails() {
        let modules = [
            PluginModule {
                path: "plugins/a.rs",
                artifacts: module_a,
            },
            PluginModule {
                path: "plugins/dup.rs",
                artifacts: module_dup,
            },
        ];

        let err = PluginRegistry::load(&modules).unwrap_err();
        match err {
            TriageError::DuplicateArtifactName { name, origin } => {
                assert_eq!(name, "Alpha one");
                assert_eq!(origin, "plugins/dup.rs");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_name_within_module_fails() {
        fn module_self_dup() -> Vec<ArtifactSpec> {
            vec![spec("Gamma", "Same"), spec("Gamma", "Same")]
        }

        let modules = [PluginModule {
            path: "plugins/self_dup.rs",
            artifacts: module_self_dup,
        }];

        assert!(matches!(
            PluginRegistry::load(&modules),
            Err(TriageError::DuplicateArtifactName { .. })
        ));
    }

    #[test]
    fn test_get_unknown_artifact() {
        let registry = PluginRegistry::load(&[]).unwrap();
        assert!(matches!(
            registry.get("Missing"),
            Err(TriageError::UnknownArtifact(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_get_returns_origin() {
        let modules = [PluginModule {
            path: "plugins/b.rs",
            artifacts: module_b,
        }];
        let registry = PluginRegistry::load(&modules).unwrap();

        let entry = registry.get("Beta one").unwrap();
        assert_eq!(entry.origin, "plugins/b.rs");
        assert_eq!(entry.spec.service, "Beta");
    }

    #[test]
    fn test_all_is_name_ordered() {
        let modules = [
            PluginModule {
                path: "plugins/b.rs",
                artifacts: module_b,
            },
            PluginModule {
                path: "plugins/a.rs",
                artifacts: module_a,
            },
        ];
        let registry = PluginRegistry::load(&modules).unwrap();

        let names: Vec<&str> = registry.all().map(|a| a.spec.name).collect();
        assert_eq!(names, vec!["Alpha one", "Alpha two", "Beta one"]);
    }
}
