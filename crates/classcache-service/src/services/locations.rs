use std::collections::BTreeSet;
use std::sync::Arc;

use classcache_sources::{LocationProvider, LocationSet};

use crate::types::AnalysisConfiguration;

/// Resolves declared packages to the [`LocationSet`] that needs to be imported.
#[derive(Clone)]
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self { provider }
    }

    /// Resolves the packages and the packages of marker types of `configuration`.
    ///
    /// Packages without any location contribute nothing. If the configuration declares no
    /// packages at all, the whole class path is resolved.
    pub fn resolve(&self, configuration: &AnalysisConfiguration) -> LocationSet {
        let packages: BTreeSet<&str> = configuration
            .packages
            .iter()
            .map(String::as_str)
            .chain(
                configuration
                    .packages_of
                    .iter()
                    .map(|marker| marker.package_name()),
            )
            .collect();

        if packages.is_empty() {
            return self.provider.class_path().into_iter().collect();
        }

        packages
            .into_iter()
            .flat_map(|package| self.provider.locations_of_package(package))
            .collect()
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use classcache_sources::{Location, TypeName};

    use super::*;

    struct StubProvider {
        packages: HashMap<&'static str, Vec<Location>>,
        roots: Vec<Location>,
    }

    impl LocationProvider for StubProvider {
        fn locations_of_package(&self, package: &str) -> Vec<Location> {
            self.packages.get(package).cloned().unwrap_or_default()
        }

        fn class_path(&self) -> Vec<Location> {
            self.roots.clone()
        }
    }

    fn dir(path: &str) -> Location {
        Location::directory(&PathBuf::from(path)).unwrap()
    }

    fn resolver() -> LocationResolver {
        let junit = Location::archive_entry(Path::new("/lib/junit.jar"), "org/junit/").unwrap();
        let provider = StubProvider {
            packages: HashMap::from([
                (
                    "com.example",
                    vec![dir("/classes/com/example"), dir("/test-classes/com/example")],
                ),
                ("com.example.service", vec![dir("/classes/com/example/service")]),
                ("org.junit", vec![junit]),
            ]),
            roots: vec![dir("/classes"), dir("/test-classes")],
        };
        LocationResolver::new(Arc::new(provider))
    }

    #[test]
    fn test_packages_and_markers_are_merged() {
        let locations = resolver().resolve(&AnalysisConfiguration {
            packages: vec!["com.example".into(), "com.example.service".into()],
            packages_of: vec![TypeName::new("org.junit.Rule")],
            ..Default::default()
        });

        assert_eq!(locations.len(), 4);
        assert!(locations.contains(&dir("/classes/com/example/service")));
    }

    #[test]
    fn test_missing_packages_are_ignored() {
        let resolver = resolver();
        let with_missing = resolver.resolve(&AnalysisConfiguration {
            packages: vec!["something.that.doesnt.exist".into()],
            packages_of: vec![TypeName::new("org.junit.Rule")],
            ..Default::default()
        });
        let without_missing = resolver.resolve(&AnalysisConfiguration {
            packages_of: vec![TypeName::new("org.junit.Rule")],
            ..Default::default()
        });

        assert_eq!(with_missing, without_missing);
    }

    #[test]
    fn test_declaration_order_does_not_matter() {
        let resolver = resolver();
        let first = resolver.resolve(&AnalysisConfiguration {
            packages: vec!["com.example".into(), "org.junit".into()],
            ..Default::default()
        });
        let second = resolver.resolve(&AnalysisConfiguration {
            packages: vec!["org.junit".into(), "com.example".into(), "org.junit".into()],
            ..Default::default()
        });

        assert_eq!(first, second);
    }

    #[test]
    fn test_nothing_declared_resolves_class_path() {
        let locations = resolver().resolve(&AnalysisConfiguration::default());
        let expected: LocationSet = [dir("/classes"), dir("/test-classes")].into_iter().collect();
        assert_eq!(locations, expected);
    }

    #[test]
    fn test_only_missing_packages_resolve_nothing() {
        let locations = resolver().resolve(&AnalysisConfiguration {
            packages: vec!["something.that.doesnt.exist".into()],
            ..Default::default()
        });
        assert!(locations.is_empty());
    }
}
